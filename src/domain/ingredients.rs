//! Ingredient catalog records: cake flavors and fillings.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flavor {
    pub id: i64,
    pub name: String,
    /// Offered for regular single-tier cakes.
    pub is_normal: bool,
    /// Offered for tiered cakes.
    pub is_tier: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filling {
    pub id: i64,
    pub name: String,
    /// Fillings that carry an extra charge.
    pub is_paid: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suboptions: Vec<String>,
    #[serde(default = "default_true")]
    pub for_normal_cakes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlavor {
    pub name: String,
    #[serde(default)]
    pub is_normal: bool,
    #[serde(default)]
    pub is_tier: bool,
}

impl NewFlavor {
    pub fn validate(&self) -> Result<(), DomainError> {
        ensure_name(&self.name, "flavor")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFilling {
    pub name: String,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suboptions: SuboptionsInput,
    #[serde(default = "default_true")]
    pub for_normal_cakes: bool,
}

impl NewFilling {
    pub fn validate(&self) -> Result<(), DomainError> {
        ensure_name(&self.name, "filling")
    }
}

/// Suboptions arrive either as a JSON list or as a comma-separated string
/// typed into a plain form input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SuboptionsInput {
    List(Vec<String>),
    Text(String),
}

impl Default for SuboptionsInput {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl SuboptionsInput {
    pub fn into_list(self) -> Vec<String> {
        match self {
            SuboptionsInput::List(items) => items,
            SuboptionsInput::Text(text) => parse_suboptions(&text),
        }
    }
}

/// Split a comma-separated suboption list, trimming entries and dropping blanks.
pub fn parse_suboptions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn ensure_name(name: &str, entity: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation(format!("{entity} name is required")));
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

// Stored rows may hold an explicit `null` suboption column.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_suboptions() {
        assert_eq!(
            parse_suboptions(" Nuez, Coco ,, Almendra ,"),
            vec!["Nuez", "Coco", "Almendra"]
        );
        assert!(parse_suboptions("").is_empty());
    }

    #[test]
    fn new_filling_accepts_string_or_list_suboptions() {
        let from_text: NewFilling =
            serde_json::from_str(r#"{"name": "Cajeta", "suboptions": "Nuez, Oreo"}"#)
                .expect("text suboptions");
        assert_eq!(from_text.suboptions.into_list(), vec!["Nuez", "Oreo"]);

        let from_list: NewFilling =
            serde_json::from_str(r#"{"name": "Nutella", "isPaid": true, "suboptions": ["Nuez"]}"#)
                .expect("list suboptions");
        assert!(from_list.is_paid);
        assert!(from_list.for_normal_cakes);
        assert_eq!(from_list.suboptions.into_list(), vec!["Nuez"]);
    }

    #[test]
    fn missing_suboptions_default_to_empty_list() {
        let filling: Filling =
            serde_json::from_str(r#"{"id": 1, "name": "Chantilly", "isPaid": false}"#)
                .expect("filling");
        assert!(filling.suboptions.is_empty());
        assert!(filling.for_normal_cakes);
    }

    #[test]
    fn null_suboptions_become_empty_list() {
        let filling: Filling = serde_json::from_str(
            r#"{"id": 2, "name": "Mermelada", "isPaid": false, "suboptions": null}"#,
        )
        .expect("filling with null suboptions");
        assert!(filling.suboptions.is_empty());

        let new_filling: NewFilling =
            serde_json::from_str(r#"{"name": "Mermelada", "suboptions": null}"#)
                .expect("new filling with null suboptions");
        assert!(new_filling.suboptions.into_list().is_empty());
    }

    #[test]
    fn blank_names_are_rejected() {
        let flavor = NewFlavor {
            name: "   ".into(),
            is_normal: true,
            is_tier: false,
        };
        assert!(matches!(
            flavor.validate(),
            Err(DomainError::Validation { .. })
        ));
    }
}
