//! Askama-backed templates for the printable documents.

use askama::Template;

use crate::application::documents::{DocumentData, DocumentKind, TemplateError, TemplateRenderer};
use crate::domain::orders::{Commission, Folio};

/// Flattened order fields ready for display.
#[derive(Clone)]
pub struct FolioView {
    pub folio_number: String,
    pub client_name: String,
    pub client_phone: String,
    pub delivery: String,
    pub delivery_location: String,
    pub persons: String,
    pub shape: String,
    pub flavors: Vec<String>,
    pub fillings: Vec<String>,
    pub design_description: String,
    pub image_urls: Vec<String>,
    pub total: String,
    pub advance_payment: String,
    pub balance: String,
}

impl From<&Folio> for FolioView {
    fn from(folio: &Folio) -> Self {
        let delivery = [folio.delivery_date.as_deref(), folio.delivery_time.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            folio_number: folio.folio_number.clone(),
            client_name: folio.client_name.clone(),
            client_phone: folio.client_phone.clone().unwrap_or_default(),
            delivery,
            delivery_location: folio.delivery_location.clone().unwrap_or_default(),
            persons: folio.persons.map(|n| n.to_string()).unwrap_or_default(),
            shape: folio.shape.clone().unwrap_or_default(),
            flavors: folio.flavors.clone(),
            fillings: folio.fillings.iter().map(|filling| filling.label()).collect(),
            design_description: folio.design_description.clone().unwrap_or_default(),
            image_urls: folio.image_urls.clone(),
            total: money(folio.total),
            advance_payment: money(folio.advance_payment),
            balance: money(folio.balance()),
        }
    }
}

#[derive(Clone)]
pub struct CommissionView {
    pub folio_number: String,
    pub client_name: String,
    pub username: String,
    pub total: String,
    pub amount: String,
}

impl From<&Commission> for CommissionView {
    fn from(commission: &Commission) -> Self {
        Self {
            folio_number: commission.folio_number.clone(),
            client_name: commission.client_name.clone(),
            username: commission.username.clone().unwrap_or_default(),
            total: money(Some(commission.total)),
            amount: money(Some(commission.amount)),
        }
    }
}

#[derive(Template)]
#[template(path = "documents/folio.html")]
pub struct FolioTemplate {
    pub folio: FolioView,
}

#[derive(Template)]
#[template(path = "documents/labels.html")]
pub struct LabelsTemplate {
    pub folios: Vec<FolioView>,
}

#[derive(Template)]
#[template(path = "documents/orders.html")]
pub struct OrdersTemplate {
    pub folios: Vec<FolioView>,
}

#[derive(Template)]
#[template(path = "documents/commission_report.html")]
pub struct CommissionReportTemplate {
    pub commissions: Vec<CommissionView>,
    pub date: String,
    pub total_amount: String,
}

/// The bundled template set, one compiled template per document kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct AskamaTemplates;

impl AskamaTemplates {
    pub fn new() -> Self {
        Self
    }

    fn known(template: &str) -> bool {
        DocumentKind::ALL
            .iter()
            .any(|kind| kind.template_name() == template)
    }
}

impl TemplateRenderer for AskamaTemplates {
    fn render(&self, template: &str, data: &DocumentData) -> Result<String, TemplateError> {
        let rendered = match (template, data) {
            ("folio", DocumentData::Folio(folio)) => FolioTemplate {
                folio: FolioView::from(folio),
            }
            .render(),
            ("labels", DocumentData::Labels(folios)) => LabelsTemplate {
                folios: folios.iter().map(FolioView::from).collect(),
            }
            .render(),
            ("orders", DocumentData::Orders(folios)) => OrdersTemplate {
                folios: folios.iter().map(FolioView::from).collect(),
            }
            .render(),
            ("commission_report", DocumentData::Commissions { commissions, date }) => {
                let total: f64 = commissions.iter().map(|c| c.amount).sum();
                CommissionReportTemplate {
                    commissions: commissions.iter().map(CommissionView::from).collect(),
                    date: date.clone(),
                    total_amount: money(Some(total)),
                }
                .render()
            }
            _ if !Self::known(template) => return Err(TemplateError::not_found(template)),
            _ => {
                return Err(TemplateError::render(
                    template,
                    format!("data bag `{}` does not fit this template", data.shape()),
                ));
            }
        };

        rendered.map_err(|err| TemplateError::render(template, err.to_string()))
    }
}

fn money(amount: Option<f64>) -> String {
    amount
        .map(|value| format!("${value:.2}"))
        .unwrap_or_default()
}
