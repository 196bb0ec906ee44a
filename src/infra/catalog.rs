//! Process-local catalog store.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::application::catalog::{
    CatalogError, CatalogRepo, CreateFillingParams, CreateFlavorParams,
};
use crate::domain::ingredients::{Filling, Flavor};

#[derive(Debug)]
pub struct InMemoryCatalog {
    flavors: DashMap<i64, Flavor>,
    fillings: DashMap<i64, Filling>,
    next_id: AtomicI64,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            flavors: DashMap::new(),
            fillings: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogRepo for InMemoryCatalog {
    async fn list_flavors(&self) -> Result<Vec<Flavor>, CatalogError> {
        let mut flavors: Vec<Flavor> = self
            .flavors
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        flavors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(flavors)
    }

    async fn create_flavor(&self, params: CreateFlavorParams) -> Result<Flavor, CatalogError> {
        let flavor = Flavor {
            id: self.allocate_id(),
            name: params.name,
            is_normal: params.is_normal,
            is_tier: params.is_tier,
        };
        self.flavors.insert(flavor.id, flavor.clone());
        Ok(flavor)
    }

    async fn delete_flavor(&self, id: i64) -> Result<(), CatalogError> {
        self.flavors
            .remove(&id)
            .map(|_| ())
            .ok_or(CatalogError::NotFound {
                entity: "flavor",
                id,
            })
    }

    async fn list_fillings(&self) -> Result<Vec<Filling>, CatalogError> {
        let mut fillings: Vec<Filling> = self
            .fillings
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        fillings.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(fillings)
    }

    async fn create_filling(&self, params: CreateFillingParams) -> Result<Filling, CatalogError> {
        let filling = Filling {
            id: self.allocate_id(),
            name: params.name,
            is_paid: params.is_paid,
            suboptions: params.suboptions,
            for_normal_cakes: params.for_normal_cakes,
        };
        self.fillings.insert(filling.id, filling.clone());
        Ok(filling)
    }

    async fn delete_filling(&self, id: i64) -> Result<(), CatalogError> {
        self.fillings
            .remove(&id)
            .map(|_| ())
            .ok_or(CatalogError::NotFound {
                entity: "filling",
                id,
            })
    }

    async fn count_flavors(&self) -> Result<u64, CatalogError> {
        Ok(self.flavors.len() as u64)
    }

    async fn count_fillings(&self) -> Result<u64, CatalogError> {
        Ok(self.fillings.len() as u64)
    }
}
