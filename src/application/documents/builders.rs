//! Per-kind request builders: pick the data bag and the print layout.
//!
//! Only the single-order receipt reserves footer space and carries the
//! "captured by" provenance line. Bulk documents stay dense with plain
//! margins and no header or footer.

use askama::filters::{Html, escape};
use chrono_tz::Tz;

use crate::domain::orders::{Commission, Folio};
use crate::util::timezone::receipt_timestamp;

use super::types::{
    DEFAULT_MAX_WAIT_MS, DocumentData, DocumentKind, HeaderFooter, LayoutOptions, Margins,
    RenderRequest,
};

pub const DEFAULT_FALLBACK_USERNAME: &str = "Sistema";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Mexico_City;

const RECEIPT_MARGINS: Margins = Margins {
    top: 25,
    right: 25,
    bottom: 40,
    left: 25,
};
const BULK_MARGINS: Margins = Margins::uniform(20);
const REPORT_MARGINS: Margins = Margins::uniform(25);

/// Settings shared by every builder.
#[derive(Debug, Clone)]
pub struct BuilderSettings {
    pub max_wait_ms: u64,
    pub timezone: Tz,
    pub fallback_username: String,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
            timezone: DEFAULT_TIMEZONE,
            fallback_username: DEFAULT_FALLBACK_USERNAME.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SingleOrderBuilder {
    settings: BuilderSettings,
}

impl SingleOrderBuilder {
    pub fn new(settings: BuilderSettings) -> Self {
        Self { settings }
    }

    pub fn build(&self, folio: &Folio) -> RenderRequest {
        let footer = footer_fragment(&self.footer_text(folio));
        let layout = LayoutOptions::letter(RECEIPT_MARGINS)
            .with_header_footer(HeaderFooter::footer(footer))
            .with_max_wait_ms(self.settings.max_wait_ms);

        RenderRequest {
            kind: DocumentKind::SingleOrder,
            data: DocumentData::Folio(folio.clone()),
            layout,
        }
    }

    /// Plain-text provenance line printed at the bottom of every page.
    pub fn footer_text(&self, folio: &Folio) -> String {
        let username = folio
            .responsible_username()
            .unwrap_or(self.settings.fallback_username.as_str());
        let captured_at = receipt_timestamp(folio.created_at, self.settings.timezone);
        format!("Pedido capturado por: {username} el {captured_at}")
    }
}

#[derive(Debug, Clone)]
pub struct LabelSheetBuilder {
    max_wait_ms: u64,
}

impl LabelSheetBuilder {
    pub fn new(settings: &BuilderSettings) -> Self {
        Self {
            max_wait_ms: settings.max_wait_ms,
        }
    }

    pub fn build(&self, folios: &[Folio]) -> RenderRequest {
        RenderRequest {
            kind: DocumentKind::LabelSheet,
            data: DocumentData::Labels(folios.to_vec()),
            layout: LayoutOptions::letter(BULK_MARGINS).with_max_wait_ms(self.max_wait_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShippingManifestBuilder {
    max_wait_ms: u64,
}

impl ShippingManifestBuilder {
    pub fn new(settings: &BuilderSettings) -> Self {
        Self {
            max_wait_ms: settings.max_wait_ms,
        }
    }

    pub fn build(&self, folios: &[Folio]) -> RenderRequest {
        RenderRequest {
            kind: DocumentKind::ShippingManifest,
            data: DocumentData::Orders(folios.to_vec()),
            layout: LayoutOptions::letter(BULK_MARGINS).with_max_wait_ms(self.max_wait_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommissionReportBuilder {
    max_wait_ms: u64,
}

impl CommissionReportBuilder {
    pub fn new(settings: &BuilderSettings) -> Self {
        Self {
            max_wait_ms: settings.max_wait_ms,
        }
    }

    pub fn build(&self, commissions: &[Commission], date: &str) -> RenderRequest {
        RenderRequest {
            kind: DocumentKind::CommissionReport,
            data: DocumentData::Commissions {
                commissions: commissions.to_vec(),
                date: date.to_string(),
            },
            layout: LayoutOptions::letter(REPORT_MARGINS).with_max_wait_ms(self.max_wait_ms),
        }
    }
}

/// The four builders configured from one set of settings.
#[derive(Debug, Clone)]
pub struct DocumentBuilders {
    pub single_order: SingleOrderBuilder,
    pub label_sheet: LabelSheetBuilder,
    pub shipping_manifest: ShippingManifestBuilder,
    pub commission_report: CommissionReportBuilder,
}

impl DocumentBuilders {
    pub fn new(settings: BuilderSettings) -> Self {
        Self {
            label_sheet: LabelSheetBuilder::new(&settings),
            shipping_manifest: ShippingManifestBuilder::new(&settings),
            commission_report: CommissionReportBuilder::new(&settings),
            single_order: SingleOrderBuilder::new(settings),
        }
    }
}

impl Default for DocumentBuilders {
    fn default() -> Self {
        Self::new(BuilderSettings::default())
    }
}

// Chrome renders header/footer templates without page styles, so the font
// size has to be set inline or the text prints nearly invisible.
fn footer_fragment(text: &str) -> String {
    let Ok(escaped) = escape(text, Html);
    format!(
        "<div style=\"width: 100%; font-size: 9pt; font-family: sans-serif; text-align: center; \
         color: #555; padding-top: 5px; border-top: 1px solid #ddd; margin-left: 25px; \
         margin-right: 25px;\">{escaped}</div>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::documents::types::PageFormat;
    use crate::domain::orders::ResponsibleUser;
    use time::macros::datetime;

    fn folio(number: &str, username: Option<&str>) -> Folio {
        Folio {
            id: Some(1),
            folio_number: number.to_string(),
            client_name: "Lucía Pérez".into(),
            client_phone: None,
            delivery_date: Some("2024-05-03".into()),
            delivery_time: None,
            delivery_location: None,
            persons: Some(20),
            shape: None,
            flavors: vec!["Vainilla".into()],
            fillings: Vec::new(),
            design_description: None,
            image_urls: Vec::new(),
            total: Some(850.0),
            advance_payment: None,
            responsible_user: username.map(|name| ResponsibleUser {
                username: name.to_string(),
            }),
            created_at: datetime!(2024-05-01 10:00:00 -06:00),
        }
    }

    #[test]
    fn single_order_footer_names_capturing_user() {
        let builders = DocumentBuilders::default();
        let request = builders.single_order.build(&folio("F-1002", Some("ana")));

        let footer = &request
            .layout
            .header_footer
            .as_ref()
            .expect("receipt shows a footer")
            .footer_html;
        assert!(
            footer.contains("Pedido capturado por: ana el 5/1/2024, 10:00:00 a.m."),
            "unexpected footer: {footer}"
        );
        assert_eq!(request.kind, DocumentKind::SingleOrder);
        assert_eq!(request.layout.page_format, PageFormat::Letter);
        assert!(request.layout.print_background);
        assert_eq!(request.layout.margins.bottom, 40);
        assert_eq!(request.template_name(), "folio");
    }

    #[test]
    fn missing_user_falls_back_to_default_label() {
        let builder = SingleOrderBuilder::new(BuilderSettings::default());
        let text = builder.footer_text(&folio("F-7", None));
        assert_eq!(text, "Pedido capturado por: Sistema el 5/1/2024, 10:00:00 a.m.");
    }

    #[test]
    fn footer_text_is_escaped() {
        let builder = SingleOrderBuilder::new(BuilderSettings::default());
        let request = builder.build(&folio("F-8", Some("<b>eve</b>")));
        let footer = request.layout.header_footer.expect("footer").footer_html;
        assert!(footer.contains("&#60;b&#62;eve&#60;/b&#62;"));
        assert!(!footer.contains("<b>eve"));
    }

    #[test]
    fn bulk_builders_accept_empty_input() {
        let builders = DocumentBuilders::default();

        let labels = builders.label_sheet.build(&[]);
        let orders = builders.shipping_manifest.build(&[]);
        let report = builders.commission_report.build(&[], "2024-05-01");

        for request in [&labels, &orders, &report] {
            assert_eq!(request.data.record_count(), 0);
            assert!(request.layout.header_footer.is_none());
            assert!(request.layout.validate().is_ok());
        }
        assert_eq!(labels.layout.margins, Margins::uniform(20));
        assert_eq!(orders.layout.margins, Margins::uniform(20));
        assert_eq!(report.layout.margins, Margins::uniform(25));
    }

    #[test]
    fn commission_report_carries_the_date() {
        let builders = DocumentBuilders::default();
        let commissions = vec![Commission {
            folio_number: "F-1".into(),
            client_name: "Ana".into(),
            username: Some("luis".into()),
            total: 500.0,
            amount: 25.0,
        }];

        let request = builders
            .commission_report
            .build(&commissions, "2024-05-01");

        match request.data {
            DocumentData::Commissions { commissions, date } => {
                assert_eq!(date, "2024-05-01");
                assert_eq!(commissions.len(), 1);
            }
            other => panic!("unexpected data bag: {other:?}"),
        }
    }

    #[test]
    fn builders_apply_configured_wait() {
        let builders = DocumentBuilders::new(BuilderSettings {
            max_wait_ms: 5_000,
            ..BuilderSettings::default()
        });

        assert_eq!(
            builders.single_order.build(&folio("F-1", None)).layout.max_wait_ms,
            5_000
        );
        assert_eq!(builders.label_sheet.build(&[]).layout.max_wait_ms, 5_000);
    }
}
