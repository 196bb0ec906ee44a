//! Render engine adapter: one isolated rendering process per document.
//!
//! The adapter owns the whole process lifecycle for a call. It launches a
//! fresh process, loads the HTML into a single page, waits for the page to go
//! network-idle under a hard deadline, prints the PDF and then terminates the
//! process exactly once, whether the earlier steps succeeded or not.

use std::{fmt, sync::Arc, time::Duration, time::Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::{LayoutOptions, PdfDocument};

/// Phase of the engine lifecycle where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStage {
    Launch,
    OpenPage,
    Load,
    Print,
    Terminate,
}

impl fmt::Display for EngineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EngineStage::Launch => "launch",
            EngineStage::OpenPage => "open_page",
            EngineStage::Load => "load",
            EngineStage::Print => "print",
            EngineStage::Terminate => "terminate",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("render engine failed during {stage}: {message}")]
    Process { stage: EngineStage, message: String },
    #[error("document content did not settle within {waited_ms} ms")]
    Timeout { waited_ms: u64 },
    #[error("invalid render input: {message}")]
    Input { message: String },
}

impl RenderError {
    pub fn process(stage: EngineStage, message: impl Into<String>) -> Self {
        Self::Process {
            stage,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }
}

/// Starts rendering processes. Each call to [`RenderEngine::launch`] must
/// return a process that shares nothing with previously launched ones.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn EngineProcess>, RenderError>;
}

/// A live rendering process owned by exactly one render call.
///
/// Implementations must also kill the underlying process when dropped without
/// [`EngineProcess::terminate`], so a cancelled caller cannot leak it.
#[async_trait]
pub trait EngineProcess: Send {
    async fn open_page(&mut self) -> Result<Box<dyn EnginePage>, RenderError>;

    async fn terminate(&mut self) -> Result<(), RenderError>;
}

/// One rendering surface inside a process.
#[async_trait]
pub trait EnginePage: Send {
    async fn load_html(&mut self, html: &str) -> Result<(), RenderError>;

    /// Resolve once the page reports no further network activity.
    async fn wait_for_network_idle(&mut self) -> Result<(), RenderError>;

    async fn print_pdf(&mut self, layout: &LayoutOptions) -> Result<Vec<u8>, RenderError>;
}

/// Turns HTML into PDF bytes through a [`RenderEngine`].
#[derive(Clone)]
pub struct PdfPrinter {
    engine: Arc<dyn RenderEngine>,
}

impl PdfPrinter {
    pub fn new(engine: Arc<dyn RenderEngine>) -> Self {
        Self { engine }
    }

    pub async fn render(
        &self,
        html: &str,
        layout: &LayoutOptions,
    ) -> Result<PdfDocument, RenderError> {
        layout.validate()?;

        let started_at = Instant::now();
        let mut process = self.engine.launch().await.inspect_err(|err| {
            warn!(
                target = "application::documents::engine",
                op = "engine::launch",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error = %err,
                "Failed to launch render process"
            );
        })?;
        debug!(
            target = "application::documents::engine",
            op = "engine::launch",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Render process launched"
        );

        let outcome = print_document(process.as_mut(), html, layout).await;

        if let Err(err) = process.terminate().await {
            warn!(
                target = "application::documents::engine",
                op = "engine::terminate",
                result = "error",
                error = %err,
                "Render process did not terminate cleanly"
            );
        }

        match &outcome {
            Ok(document) => info!(
                target = "application::documents::engine",
                op = "engine::render",
                result = "ok",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                html_bytes = html.len(),
                pdf_bytes = document.len(),
                "PDF printed"
            ),
            Err(err) => warn!(
                target = "application::documents::engine",
                op = "engine::render",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                html_bytes = html.len(),
                error = %err,
                "PDF printing failed"
            ),
        }

        outcome
    }
}

async fn print_document(
    process: &mut dyn EngineProcess,
    html: &str,
    layout: &LayoutOptions,
) -> Result<PdfDocument, RenderError> {
    let mut page = process.open_page().await?;

    let deadline = Duration::from_millis(layout.max_wait_ms);
    let settled = tokio::time::timeout(deadline, async {
        page.load_html(html).await?;
        page.wait_for_network_idle().await
    })
    .await;

    match settled {
        Ok(result) => result?,
        Err(_) => {
            return Err(RenderError::Timeout {
                waited_ms: layout.max_wait_ms,
            });
        }
    }

    let bytes = page.print_pdf(layout).await?;
    PdfDocument::from_engine(bytes)
}


#[cfg(test)]
mod tests {
    use super::testing::{Behavior, FakeEngine};
    use super::*;

    fn printer(engine: &FakeEngine) -> PdfPrinter {
        PdfPrinter::new(Arc::new(engine.clone()))
    }

    #[tokio::test]
    async fn successful_render_terminates_process_once() {
        let engine = FakeEngine::default();

        let document = printer(&engine)
            .render("<p>hola</p>", &LayoutOptions::default())
            .await
            .expect("pdf rendered");

        assert!(document.as_bytes().starts_with(b"%PDF-"));
        assert_eq!(engine.counters.launched(), 1);
        assert_eq!(engine.counters.terminated(), 1);
        assert_eq!(engine.counters.dropped(), 1);
    }

    #[tokio::test]
    async fn empty_html_is_a_blank_document() {
        let engine = FakeEngine::default();

        let document = printer(&engine)
            .render("", &LayoutOptions::default())
            .await
            .expect("blank pdf");

        assert!(document.as_bytes().starts_with(b"%PDF-"));
        assert_eq!(engine.counters.terminated(), 1);
    }

    #[tokio::test]
    async fn hung_page_times_out_and_still_terminates() {
        let engine = FakeEngine::with_behavior(Behavior::HangOnIdle);
        let layout = LayoutOptions::default().with_max_wait_ms(50);

        let err = printer(&engine)
            .render("<img src=\"http://10.255.255.1/never.png\">", &layout)
            .await
            .expect_err("render must time out");

        assert!(matches!(err, RenderError::Timeout { waited_ms: 50 }));
        assert_eq!(engine.counters.launched(), 1);
        assert_eq!(engine.counters.terminated(), 1);
    }

    #[tokio::test]
    async fn cancelled_render_drops_process_without_terminate() {
        let engine = FakeEngine::with_behavior(Behavior::HangOnIdle);
        let layout = LayoutOptions::default().with_max_wait_ms(30_000);
        let printer = printer(&engine);

        let cancelled = tokio::time::timeout(
            Duration::from_millis(50),
            printer.render("<p>pendiente</p>", &layout),
        )
        .await;

        assert!(cancelled.is_err(), "caller gave up before the deadline");
        assert_eq!(engine.counters.launched(), 1);
        assert_eq!(engine.counters.terminated(), 0);
        assert_eq!(engine.counters.dropped(), 1);
    }

    #[tokio::test]
    async fn load_failure_terminates_process_once() {
        let engine = FakeEngine::with_behavior(Behavior::FailLoad);

        let err = printer(&engine)
            .render("<p></p>", &LayoutOptions::default())
            .await
            .expect_err("load fails");

        assert!(matches!(
            err,
            RenderError::Process {
                stage: EngineStage::Load,
                ..
            }
        ));
        assert_eq!(engine.counters.terminated(), 1);
    }

    #[tokio::test]
    async fn print_failure_terminates_process_once() {
        let engine = FakeEngine::with_behavior(Behavior::FailPrint);

        let err = printer(&engine)
            .render("<p></p>", &LayoutOptions::default())
            .await
            .expect_err("print fails");

        assert!(matches!(
            err,
            RenderError::Process {
                stage: EngineStage::Print,
                ..
            }
        ));
        assert_eq!(engine.counters.terminated(), 1);
    }

    #[tokio::test]
    async fn non_pdf_output_is_rejected() {
        let engine = FakeEngine::with_behavior(Behavior::PrintGarbage);

        let err = printer(&engine)
            .render("<p>not a pdf</p>", &LayoutOptions::default())
            .await
            .expect_err("garbage rejected");

        assert!(matches!(err, RenderError::Process { .. }));
        assert_eq!(engine.counters.terminated(), 1);
    }

    #[tokio::test]
    async fn launch_failure_has_nothing_to_terminate() {
        let engine = FakeEngine::with_behavior(Behavior::FailLaunch);

        let err = printer(&engine)
            .render("<p></p>", &LayoutOptions::default())
            .await
            .expect_err("launch fails");

        assert!(matches!(
            err,
            RenderError::Process {
                stage: EngineStage::Launch,
                ..
            }
        ));
        assert_eq!(engine.counters.launched(), 1);
        assert_eq!(engine.counters.terminated(), 0);
    }

    #[tokio::test]
    async fn invalid_layout_never_launches() {
        let engine = FakeEngine::default();
        let layout = LayoutOptions::default().with_max_wait_ms(0);

        let err = printer(&engine)
            .render("<p></p>", &layout)
            .await
            .expect_err("invalid layout");

        assert!(matches!(err, RenderError::Input { .. }));
        assert_eq!(engine.counters.launched(), 0);
    }
}
