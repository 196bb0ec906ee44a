use std::{num::NonZeroUsize, sync::Arc, time::Instant};

use metrics::{Gauge, counter, gauge, histogram};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::domain::orders::{Commission, Folio};

use super::{
    builders::DocumentBuilders,
    engine::{EngineStage, PdfPrinter, RenderError},
    templates::{TemplateError, TemplateRenderer},
    types::{PdfDocument, RenderRequest},
};

/// Failure of a whole document render. The variant is meant for operator
/// logs; callers show users [`DocumentError::public_message`] only.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl DocumentError {
    pub const PUBLIC_MESSAGE: &'static str = "No se pudo generar el documento";

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentError::Template(TemplateError::NotFound { .. }) => "template_not_found",
            DocumentError::Template(TemplateError::Render { .. }) => "template_render",
            DocumentError::Render(RenderError::Process { .. }) => "render_process",
            DocumentError::Render(RenderError::Timeout { .. }) => "render_timeout",
            DocumentError::Render(RenderError::Input { .. }) => "render_input",
        }
    }

    pub fn public_message(&self) -> &'static str {
        Self::PUBLIC_MESSAGE
    }
}

/// Counts a render in the in-flight gauge until dropped, so a cancelled
/// caller still releases its slot.
struct InFlight(Gauge);

impl InFlight {
    fn enter() -> Self {
        let gauge = gauge!("bakehouse_document_renders_in_flight");
        gauge.increment(1.0);
        Self(gauge)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.decrement(1.0);
    }
}

/// Drives template rendering and PDF printing for every document kind.
#[derive(Clone)]
pub struct DocumentService {
    templates: Arc<dyn TemplateRenderer>,
    printer: PdfPrinter,
    builders: DocumentBuilders,
    admission: Option<Arc<Semaphore>>,
}

impl DocumentService {
    pub fn new(
        templates: Arc<dyn TemplateRenderer>,
        printer: PdfPrinter,
        builders: DocumentBuilders,
    ) -> Self {
        Self {
            templates,
            printer,
            builders,
            admission: None,
        }
    }

    /// Bound the number of rendering processes alive at the same time.
    pub fn with_admission_limit(mut self, limit: NonZeroUsize) -> Self {
        self.admission = Some(Arc::new(Semaphore::new(limit.get())));
        self
    }

    pub fn builders(&self) -> &DocumentBuilders {
        &self.builders
    }

    pub async fn render(&self, request: &RenderRequest) -> Result<PdfDocument, DocumentError> {
        let started_at = Instant::now();
        let kind = request.kind;

        let in_flight = InFlight::enter();
        let result = self.render_inner(request).await;
        drop(in_flight);
        let elapsed_ms = started_at.elapsed().as_millis() as u64;

        match &result {
            Ok(document) => {
                counter!("bakehouse_documents_rendered_total", "kind" => kind.as_str())
                    .increment(1);
                histogram!("bakehouse_document_render_ms", "kind" => kind.as_str())
                    .record(elapsed_ms as f64);
                info!(
                    target = "application::documents::service",
                    op = "documents::render",
                    result = "ok",
                    kind = %kind,
                    records = request.data.record_count(),
                    elapsed_ms,
                    pdf_bytes = document.len(),
                    "Document rendered"
                );
            }
            Err(err) => {
                counter!(
                    "bakehouse_document_render_failures_total",
                    "kind" => kind.as_str(),
                    "error" => err.kind()
                )
                .increment(1);
                error!(
                    target = "application::documents::service",
                    op = "documents::render",
                    result = "error",
                    kind = %kind,
                    records = request.data.record_count(),
                    elapsed_ms,
                    error_code = err.kind(),
                    error = %err,
                    "Document rendering failed"
                );
            }
        }

        result
    }

    async fn render_inner(&self, request: &RenderRequest) -> Result<PdfDocument, DocumentError> {
        let html = self
            .templates
            .render(request.template_name(), &request.data)?;

        let _permit = match &self.admission {
            Some(semaphore) => Some(semaphore.acquire().await.map_err(|_| {
                RenderError::process(EngineStage::Launch, "render admission queue closed")
            })?),
            None => None,
        };

        Ok(self.printer.render(&html, &request.layout).await?)
    }

    /// Receipt for one order, with the capture footer.
    pub async fn create_folio_pdf(&self, folio: &Folio) -> Result<PdfDocument, DocumentError> {
        let request = self.builders.single_order.build(folio);
        self.render(&request).await
    }

    /// Production labels for a batch of orders.
    pub async fn create_labels_pdf(&self, folios: &[Folio]) -> Result<PdfDocument, DocumentError> {
        let request = self.builders.label_sheet.build(folios);
        self.render(&request).await
    }

    /// Shipping manifest for a batch of orders.
    pub async fn create_orders_pdf(&self, folios: &[Folio]) -> Result<PdfDocument, DocumentError> {
        let request = self.builders.shipping_manifest.build(folios);
        self.render(&request).await
    }

    pub async fn create_commission_report_pdf(
        &self,
        commissions: &[Commission],
        date: &str,
    ) -> Result<PdfDocument, DocumentError> {
        let request = self.builders.commission_report.build(commissions, date);
        self.render(&request).await
    }
}
