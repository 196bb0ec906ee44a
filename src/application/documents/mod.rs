//! Document rendering pipeline.
//!
//! Structured order data is turned into HTML by a [`TemplateRenderer`] and
//! printed to PDF by a [`PdfPrinter`] that owns one short-lived rendering
//! process per call. Builders pick the template data and the print layout for
//! each [`DocumentKind`].

mod builders;
mod engine;
mod service;
mod templates;
mod types;

pub use builders::{
    BuilderSettings, CommissionReportBuilder, DEFAULT_FALLBACK_USERNAME, DEFAULT_TIMEZONE,
    DocumentBuilders, LabelSheetBuilder, ShippingManifestBuilder, SingleOrderBuilder,
};
pub use engine::{EnginePage, EngineProcess, EngineStage, PdfPrinter, RenderEngine, RenderError};
pub use service::{DocumentError, DocumentService};
pub use templates::{TemplateError, TemplateRenderer};
pub use types::{
    CSS_PX_PER_INCH, DEFAULT_MAX_WAIT_MS, DocumentData, DocumentKind, HeaderFooter,
    LayoutOptions, Margins, PageFormat, PdfDocument, RenderRequest,
};
