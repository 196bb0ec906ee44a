use std::{fmt, str::FromStr};

use bytes::Bytes;

use crate::domain::orders::{Commission, Folio};

use super::engine::RenderError;

/// CSS pixels per inch, as used by the print engine for margin conversion.
pub const CSS_PX_PER_INCH: f64 = 96.0;

pub const DEFAULT_MAX_WAIT_MS: u64 = 30_000;

const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Document families produced by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    SingleOrder,
    LabelSheet,
    ShippingManifest,
    CommissionReport,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::SingleOrder,
        DocumentKind::LabelSheet,
        DocumentKind::ShippingManifest,
        DocumentKind::CommissionReport,
    ];

    /// Name of the template rendering this kind.
    pub fn template_name(self) -> &'static str {
        match self {
            DocumentKind::SingleOrder => "folio",
            DocumentKind::LabelSheet => "labels",
            DocumentKind::ShippingManifest => "orders",
            DocumentKind::CommissionReport => "commission_report",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::SingleOrder => "single_order",
            DocumentKind::LabelSheet => "label_sheet",
            DocumentKind::ShippingManifest => "shipping_manifest",
            DocumentKind::CommissionReport => "commission_report",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    /// Accepts the snake_case label or its kebab-case spelling.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().replace('-', "_");
        DocumentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = DocumentKind::ALL.iter().map(|kind| kind.as_str()).collect();
                format!("unknown document kind `{value}` (expected one of {})", known.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageFormat {
    #[default]
    Letter,
    Legal,
    A4,
}

impl PageFormat {
    /// Paper size in inches as `(width, height)`.
    pub fn dimensions_in(self) -> (f64, f64) {
        match self {
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Legal => (8.5, 14.0),
            PageFormat::A4 => (8.27, 11.69),
        }
    }
}

/// Page margins in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    pub const fn uniform(px: u32) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }
}

/// Literal HTML fragments printed in the page header and footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFooter {
    pub header_html: String,
    pub footer_html: String,
}

impl HeaderFooter {
    /// The print engine needs a non-empty template for both slots once
    /// header/footer display is on; blank fragments fall back to an empty div.
    pub const EMPTY_FRAGMENT: &'static str = "<div></div>";

    pub fn footer(footer_html: impl Into<String>) -> Self {
        Self {
            header_html: Self::EMPTY_FRAGMENT.to_string(),
            footer_html: footer_html.into(),
        }
    }

    pub fn resolved_header(&self) -> &str {
        non_blank_or_empty(&self.header_html)
    }

    pub fn resolved_footer(&self) -> &str {
        non_blank_or_empty(&self.footer_html)
    }
}

fn non_blank_or_empty(fragment: &str) -> &str {
    if fragment.trim().is_empty() {
        HeaderFooter::EMPTY_FRAGMENT
    } else {
        fragment
    }
}

/// Print configuration handed to the render engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOptions {
    pub page_format: PageFormat,
    pub margins: Margins,
    /// `Some` turns on header/footer display.
    pub header_footer: Option<HeaderFooter>,
    pub print_background: bool,
    /// Upper bound for content load plus network idle.
    pub max_wait_ms: u64,
}

impl LayoutOptions {
    pub fn letter(margins: Margins) -> Self {
        Self {
            page_format: PageFormat::Letter,
            margins,
            header_footer: None,
            print_background: true,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
        }
    }

    pub fn with_header_footer(mut self, header_footer: HeaderFooter) -> Self {
        self.header_footer = Some(header_footer);
        self
    }

    pub fn with_max_wait_ms(mut self, max_wait_ms: u64) -> Self {
        self.max_wait_ms = max_wait_ms;
        self
    }

    pub fn shows_header_footer(&self) -> bool {
        self.header_footer.is_some()
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.max_wait_ms == 0 {
            return Err(RenderError::input("max_wait_ms must be greater than zero"));
        }

        let (width_in, height_in) = self.page_format.dimensions_in();
        let width_px = width_in * CSS_PX_PER_INCH;
        let height_px = height_in * CSS_PX_PER_INCH;
        let horizontal = f64::from(self.margins.left) + f64::from(self.margins.right);
        let vertical = f64::from(self.margins.top) + f64::from(self.margins.bottom);

        if horizontal >= width_px || vertical >= height_px {
            return Err(RenderError::input(format!(
                "margins leave no printable area on a {:?} page",
                self.page_format
            )));
        }

        Ok(())
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::letter(Margins::uniform(20))
    }
}

/// Canonical data bag for each document kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentData {
    Folio(Folio),
    Labels(Vec<Folio>),
    Orders(Vec<Folio>),
    Commissions {
        commissions: Vec<Commission>,
        date: String,
    },
}

impl DocumentData {
    pub fn shape(&self) -> &'static str {
        match self {
            DocumentData::Folio(_) => "folio",
            DocumentData::Labels(_) => "labels",
            DocumentData::Orders(_) => "orders",
            DocumentData::Commissions { .. } => "commissions",
        }
    }

    /// Number of records carried by the bag.
    pub fn record_count(&self) -> usize {
        match self {
            DocumentData::Folio(_) => 1,
            DocumentData::Labels(folios) | DocumentData::Orders(folios) => folios.len(),
            DocumentData::Commissions { commissions, .. } => commissions.len(),
        }
    }
}

/// Everything needed to produce one document. Built fresh per call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub kind: DocumentKind,
    pub data: DocumentData,
    pub layout: LayoutOptions,
}

impl RenderRequest {
    pub fn template_name(&self) -> &'static str {
        self.kind.template_name()
    }
}

/// Finished PDF bytes. Cheap to clone, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument(Bytes);

impl PdfDocument {
    /// Accept engine output only when it carries the PDF signature.
    pub fn from_engine(bytes: Vec<u8>) -> Result<Self, RenderError> {
        if !bytes.starts_with(PDF_SIGNATURE) {
            return Err(RenderError::process(
                super::engine::EngineStage::Print,
                format!(
                    "engine returned {} bytes without a PDF signature",
                    bytes.len()
                ),
            ));
        }
        Ok(Self(Bytes::from(bytes)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for PdfDocument {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
