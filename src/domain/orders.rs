//! Order-side records consumed by the document pipeline.
//!
//! Field names follow the camelCase payloads produced by the order-capture
//! frontend, so records deserialize straight from request bodies.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Staff member who captured an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsibleUser {
    pub username: String,
}

/// A filling chosen for an order, optionally narrowed to one suboption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillingSelection {
    pub name: String,
    #[serde(default)]
    pub suboption: Option<String>,
}

impl FillingSelection {
    /// Human-readable label, e.g. `Manjar (Nuez)`.
    pub fn label(&self) -> String {
        match self.suboption.as_deref().map(str::trim) {
            Some(sub) if !sub.is_empty() => format!("{} ({sub})", self.name),
            _ => self.name.clone(),
        }
    }
}

/// A captured order ("folio").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folio {
    #[serde(default)]
    pub id: Option<i64>,
    pub folio_number: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub delivery_time: Option<String>,
    #[serde(default)]
    pub delivery_location: Option<String>,
    #[serde(default)]
    pub persons: Option<u32>,
    #[serde(default)]
    pub shape: Option<String>,
    #[serde(default)]
    pub flavors: Vec<String>,
    #[serde(default)]
    pub fillings: Vec<FillingSelection>,
    #[serde(default)]
    pub design_description: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub advance_payment: Option<f64>,
    #[serde(default)]
    pub responsible_user: Option<ResponsibleUser>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Folio {
    /// Outstanding amount once the advance payment is discounted.
    pub fn balance(&self) -> Option<f64> {
        self.total
            .map(|total| total - self.advance_payment.unwrap_or_default())
    }

    pub fn responsible_username(&self) -> Option<&str> {
        self.responsible_user
            .as_ref()
            .map(|user| user.username.trim())
            .filter(|name| !name.is_empty())
    }
}

/// One line of the daily commission report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub folio_number: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub total: f64,
    pub amount: f64,
}
