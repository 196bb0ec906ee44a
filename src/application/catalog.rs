//! Flavor and filling catalog offered when capturing an order.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::error::DomainError;
use crate::domain::ingredients::{Filling, Flavor, NewFilling, NewFlavor};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog entry: {message}")]
    Validation { message: String },
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("catalog storage error: {0}")]
    Persistence(String),
}

impl CatalogError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<DomainError> for CatalogError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { message } => Self::Validation { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFlavorParams {
    pub name: String,
    pub is_normal: bool,
    pub is_tier: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFillingParams {
    pub name: String,
    pub is_paid: bool,
    pub suboptions: Vec<String>,
    pub for_normal_cakes: bool,
}

#[async_trait]
pub trait CatalogRepo: Send + Sync {
    /// All flavors ordered by name.
    async fn list_flavors(&self) -> Result<Vec<Flavor>, CatalogError>;

    async fn create_flavor(&self, params: CreateFlavorParams) -> Result<Flavor, CatalogError>;

    async fn delete_flavor(&self, id: i64) -> Result<(), CatalogError>;

    /// All fillings ordered by name.
    async fn list_fillings(&self) -> Result<Vec<Filling>, CatalogError>;

    async fn create_filling(&self, params: CreateFillingParams) -> Result<Filling, CatalogError>;

    async fn delete_filling(&self, id: i64) -> Result<(), CatalogError>;

    async fn count_flavors(&self) -> Result<u64, CatalogError>;

    async fn count_fillings(&self) -> Result<u64, CatalogError>;
}

const NORMAL_FLAVORS: &[&str] = &[
    "Vainilla",
    "Chocolate",
    "Red Velvet",
    "Mantequilla",
    "Nata",
    "Queso",
    "3 Leches",
    "Pastel de queso",
    "Queso/Flan",
    "Zanahoria",
    "Mil Hojas",
    "Flan",
];

const TIER_FLAVORS: &[&str] = &[
    "Vainilla",
    "Chocolate",
    "Red Velvet",
    "Mantequilla",
    "Nata",
    "Queso",
    "Flan",
];

const INCLUDED_FILLINGS: &[(&str, &[&str])] = &[
    ("Manjar", &["Nuez", "Coco", "Almendra", "Cajeta"]),
    ("Cajeta", &["Nuez", "Coco", "Oreo"]),
    ("Chantilly", &["Duraznos", "Fresas", "Piña"]),
    ("Mermelada", &["Fresa", "Zarzamora", "Piña", "Chabacano"]),
    ("Crema de Queso", &["Cajeta", "Envinada"]),
];

const PAID_FILLINGS: &[(&str, &[&str])] = &[
    ("Nutella", &["Nuez", "Almendra"]),
    ("Dulce de Leche", &["Nuez", "Almendra", "Envinada"]),
    ("Nuez", &["Capuchino", "Mocka", "Chocolate"]),
    ("Cremas", &["Yogurth de fresa", "Café con o sin brandy"]),
    ("Duraznos", &["Rompope", "Crema de Yogurth", "Chantilly"]),
];

/// Initial flavors with the normal and tier lists merged by name.
pub fn seed_flavors() -> Vec<CreateFlavorParams> {
    let mut merged: Vec<CreateFlavorParams> = Vec::new();

    for name in NORMAL_FLAVORS {
        merged.push(CreateFlavorParams {
            name: (*name).to_string(),
            is_normal: true,
            is_tier: false,
        });
    }

    for name in TIER_FLAVORS {
        match merged.iter_mut().find(|flavor| flavor.name == *name) {
            Some(existing) => existing.is_tier = true,
            None => merged.push(CreateFlavorParams {
                name: (*name).to_string(),
                is_normal: false,
                is_tier: true,
            }),
        }
    }

    merged
}

pub fn seed_fillings() -> Vec<CreateFillingParams> {
    let included = INCLUDED_FILLINGS.iter().map(|entry| (entry, false));
    let paid = PAID_FILLINGS.iter().map(|entry| (entry, true));

    included
        .chain(paid)
        .map(|((name, suboptions), is_paid)| CreateFillingParams {
            name: (*name).to_string(),
            is_paid,
            suboptions: suboptions.iter().map(|s| (*s).to_string()).collect(),
            for_normal_cakes: true,
        })
        .collect()
}

/// What a seeding pass inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedOutcome {
    pub flavors: usize,
    pub fillings: usize,
}

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepo>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepo>) -> Self {
        Self { repo }
    }

    pub async fn list_flavors(&self) -> Result<Vec<Flavor>, CatalogError> {
        self.repo.list_flavors().await
    }

    pub async fn list_fillings(&self) -> Result<Vec<Filling>, CatalogError> {
        self.repo.list_fillings().await
    }

    pub async fn add_flavor(&self, input: NewFlavor) -> Result<Flavor, CatalogError> {
        input.validate()?;
        self.repo
            .create_flavor(CreateFlavorParams {
                name: input.name.trim().to_string(),
                is_normal: input.is_normal,
                is_tier: input.is_tier,
            })
            .await
    }

    pub async fn add_filling(&self, input: NewFilling) -> Result<Filling, CatalogError> {
        input.validate()?;
        let NewFilling {
            name,
            is_paid,
            suboptions,
            for_normal_cakes,
        } = input;

        self.repo
            .create_filling(CreateFillingParams {
                name: name.trim().to_string(),
                is_paid,
                suboptions: suboptions.into_list(),
                for_normal_cakes,
            })
            .await
    }

    pub async fn remove_flavor(&self, id: i64) -> Result<(), CatalogError> {
        self.repo.delete_flavor(id).await
    }

    pub async fn remove_filling(&self, id: i64) -> Result<(), CatalogError> {
        self.repo.delete_filling(id).await
    }

    /// Insert the initial catalog into empty tables. Failures are logged
    /// and the pass moves on; startup never fails because of seeding.
    pub async fn seed_if_empty(&self) -> SeedOutcome {
        let mut outcome = SeedOutcome::default();

        match self.repo.count_flavors().await {
            Ok(0) => {
                for params in seed_flavors() {
                    match self.repo.create_flavor(params).await {
                        Ok(_) => outcome.flavors += 1,
                        Err(err) => warn!(
                            target = "application::catalog",
                            op = "catalog::seed_flavors",
                            result = "error",
                            error = %err,
                            "Failed to seed flavor"
                        ),
                    }
                }
            }
            Ok(_) => {}
            Err(err) => warn!(
                target = "application::catalog",
                op = "catalog::seed_flavors",
                result = "error",
                error = %err,
                "Could not count flavors; skipping seed"
            ),
        }

        match self.repo.count_fillings().await {
            Ok(0) => {
                for params in seed_fillings() {
                    match self.repo.create_filling(params).await {
                        Ok(_) => outcome.fillings += 1,
                        Err(err) => warn!(
                            target = "application::catalog",
                            op = "catalog::seed_fillings",
                            result = "error",
                            error = %err,
                            "Failed to seed filling"
                        ),
                    }
                }
            }
            Ok(_) => {}
            Err(err) => warn!(
                target = "application::catalog",
                op = "catalog::seed_fillings",
                result = "error",
                error = %err,
                "Could not count fillings; skipping seed"
            ),
        }

        info!(
            target = "application::catalog",
            op = "catalog::seed",
            result = "ok",
            flavors = outcome.flavors,
            fillings = outcome.fillings,
            "Catalog seed pass finished"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingredients::SuboptionsInput;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRepo {
        flavors: Mutex<Vec<Flavor>>,
        fillings: Mutex<Vec<Filling>>,
        fail_writes: bool,
    }

    #[async_trait]
    impl CatalogRepo for RecordingRepo {
        async fn list_flavors(&self) -> Result<Vec<Flavor>, CatalogError> {
            Ok(self.flavors.lock().unwrap().clone())
        }

        async fn create_flavor(&self, params: CreateFlavorParams) -> Result<Flavor, CatalogError> {
            if self.fail_writes {
                return Err(CatalogError::from_persistence("disk full"));
            }
            let mut flavors = self.flavors.lock().unwrap();
            let flavor = Flavor {
                id: flavors.len() as i64 + 1,
                name: params.name,
                is_normal: params.is_normal,
                is_tier: params.is_tier,
            };
            flavors.push(flavor.clone());
            Ok(flavor)
        }

        async fn delete_flavor(&self, id: i64) -> Result<(), CatalogError> {
            let mut flavors = self.flavors.lock().unwrap();
            let before = flavors.len();
            flavors.retain(|flavor| flavor.id != id);
            if flavors.len() == before {
                return Err(CatalogError::NotFound {
                    entity: "flavor",
                    id,
                });
            }
            Ok(())
        }

        async fn list_fillings(&self) -> Result<Vec<Filling>, CatalogError> {
            Ok(self.fillings.lock().unwrap().clone())
        }

        async fn create_filling(
            &self,
            params: CreateFillingParams,
        ) -> Result<Filling, CatalogError> {
            if self.fail_writes {
                return Err(CatalogError::from_persistence("disk full"));
            }
            let mut fillings = self.fillings.lock().unwrap();
            let filling = Filling {
                id: fillings.len() as i64 + 1,
                name: params.name,
                is_paid: params.is_paid,
                suboptions: params.suboptions,
                for_normal_cakes: params.for_normal_cakes,
            };
            fillings.push(filling.clone());
            Ok(filling)
        }

        async fn delete_filling(&self, _id: i64) -> Result<(), CatalogError> {
            unreachable!("not used in these tests")
        }

        async fn count_flavors(&self) -> Result<u64, CatalogError> {
            Ok(self.flavors.lock().unwrap().len() as u64)
        }

        async fn count_fillings(&self) -> Result<u64, CatalogError> {
            Ok(self.fillings.lock().unwrap().len() as u64)
        }
    }

    #[test]
    fn seed_flavors_merge_normal_and_tier_lists() {
        let flavors = seed_flavors();

        assert_eq!(flavors.len(), NORMAL_FLAVORS.len());
        let vanilla = flavors
            .iter()
            .find(|flavor| flavor.name == "Vainilla")
            .expect("vanilla seeded");
        assert!(vanilla.is_normal && vanilla.is_tier);

        let carrot = flavors
            .iter()
            .find(|flavor| flavor.name == "Zanahoria")
            .expect("carrot seeded");
        assert!(carrot.is_normal && !carrot.is_tier);
    }

    #[test]
    fn seed_fillings_split_included_and_paid() {
        let fillings = seed_fillings();

        let manjar = fillings.iter().find(|f| f.name == "Manjar").expect("manjar");
        assert!(!manjar.is_paid);
        assert_eq!(manjar.suboptions, vec!["Nuez", "Coco", "Almendra", "Cajeta"]);

        let nutella = fillings.iter().find(|f| f.name == "Nutella").expect("nutella");
        assert!(nutella.is_paid);
        assert_eq!(fillings.len(), 10);
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let repo = Arc::new(RecordingRepo::default());
        let service = CatalogService::new(repo.clone());

        let first = service.seed_if_empty().await;
        let second = service.seed_if_empty().await;

        assert_eq!(first.flavors, NORMAL_FLAVORS.len());
        assert_eq!(first.fillings, 10);
        assert_eq!(second, SeedOutcome::default());
        assert_eq!(repo.flavors.lock().unwrap().len(), NORMAL_FLAVORS.len());
    }

    #[tokio::test]
    async fn seeding_failures_are_swallowed() {
        let repo = Arc::new(RecordingRepo {
            fail_writes: true,
            ..RecordingRepo::default()
        });
        let service = CatalogService::new(repo);

        assert_eq!(service.seed_if_empty().await, SeedOutcome::default());
    }

    #[tokio::test]
    async fn add_filling_parses_text_suboptions() {
        let repo = Arc::new(RecordingRepo::default());
        let service = CatalogService::new(repo);

        let filling = service
            .add_filling(NewFilling {
                name: "  Frutos rojos ".into(),
                is_paid: true,
                suboptions: SuboptionsInput::Text("Fresa, Frambuesa,".into()),
                for_normal_cakes: false,
            })
            .await
            .expect("filling created");

        assert_eq!(filling.name, "Frutos rojos");
        assert_eq!(filling.suboptions, vec!["Fresa", "Frambuesa"]);
        assert!(!filling.for_normal_cakes);
    }

    #[tokio::test]
    async fn blank_flavor_name_is_rejected() {
        let repo = Arc::new(RecordingRepo::default());
        let service = CatalogService::new(repo.clone());

        let err = service
            .add_flavor(NewFlavor {
                name: " ".into(),
                is_normal: true,
                is_tier: false,
            })
            .await
            .expect_err("blank name");

        assert!(matches!(err, CatalogError::Validation { .. }));
        assert!(repo.flavors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn removing_unknown_flavor_is_not_found() {
        let service = CatalogService::new(Arc::new(RecordingRepo::default()));
        let err = service.remove_flavor(42).await.expect_err("missing");
        assert!(matches!(err, CatalogError::NotFound { entity: "flavor", id: 42 }));
    }
}
