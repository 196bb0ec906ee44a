//! Headless Chrome implementation of the render engine.
//!
//! Every launch starts a private browser process. `headless_chrome` drives the
//! browser synchronously, so each call runs on the blocking pool.

use std::{
    ffi::OsStr,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab, types::PrintToPdfOptions};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use url::Url;

use crate::application::documents::{
    CSS_PX_PER_INCH, EnginePage, EngineProcess, EngineStage, LayoutOptions, RenderEngine,
    RenderError,
};

const LAUNCH_ARGS: &[&str] = &[
    "--disable-setuid-sandbox",
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--font-render-hinting=none",
];

/// How long the browser may sit without DevTools traffic before it gives up.
const BROWSER_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
/// Upper bound for a single DevTools call.
const TAB_CALL_TIMEOUT: Duration = Duration::from_secs(60);
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// The page must report settled for this long before printing.
const IDLE_QUIET_PERIOD: Duration = Duration::from_millis(500);

const SETTLED_CHECK: &str = "(() => document.readyState === 'complete' \
    && Array.from(document.images).every((img) => img.complete) \
    && (!document.fonts || document.fonts.status === 'loaded'))()";

#[derive(Debug, Clone, Default)]
pub struct ChromeEngine {
    executable: Option<PathBuf>,
}

impl ChromeEngine {
    /// `executable` overrides the browser binary; `None` lets
    /// `headless_chrome` locate an installed Chrome or Chromium.
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }
}

#[async_trait]
impl RenderEngine for ChromeEngine {
    async fn launch(&self) -> Result<Box<dyn EngineProcess>, RenderError> {
        let executable = self.executable.clone();
        let started_at = Instant::now();

        let browser = blocking(EngineStage::Launch, move || {
            let options = launch_options(executable)?;
            Browser::new(options).map_err(|err| err.to_string())
        })
        .await?;

        debug!(
            target = "infra::chrome",
            op = "chrome::launch",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            pid = browser.get_process_id(),
            "Chrome process started"
        );

        Ok(Box::new(ChromeProcess {
            browser: Some(browser),
        }))
    }
}

fn launch_options(executable: Option<PathBuf>) -> Result<LaunchOptions<'static>, String> {
    LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .path(executable)
        .args(LAUNCH_ARGS.iter().map(|arg| OsStr::new(*arg)).collect())
        .idle_browser_timeout(BROWSER_IDLE_TIMEOUT)
        .build()
        .map_err(|err| err.to_string())
}

/// Owns one browser. Dropping the last handle kills the process.
pub struct ChromeProcess {
    browser: Option<Browser>,
}

#[async_trait]
impl EngineProcess for ChromeProcess {
    async fn open_page(&mut self) -> Result<Box<dyn EnginePage>, RenderError> {
        let browser = self.browser.as_ref().ok_or_else(|| {
            RenderError::process(EngineStage::OpenPage, "process already terminated")
        })?;

        let browser = browser.clone();
        let tab = blocking(EngineStage::OpenPage, move || {
            browser.new_tab().map_err(|err| err.to_string())
        })
        .await?;
        tab.set_default_timeout(TAB_CALL_TIMEOUT);

        Ok(Box::new(ChromePage {
            tab,
            document: None,
        }))
    }

    async fn terminate(&mut self) -> Result<(), RenderError> {
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };
        let pid = browser.get_process_id();

        blocking(EngineStage::Terminate, move || {
            drop(browser);
            Ok::<_, String>(())
        })
        .await?;

        debug!(
            target = "infra::chrome",
            op = "chrome::terminate",
            result = "ok",
            pid,
            "Chrome process terminated"
        );
        Ok(())
    }
}

impl Drop for ChromeProcess {
    fn drop(&mut self) {
        if let Some(browser) = self.browser.take() {
            warn!(
                target = "infra::chrome",
                op = "chrome::drop",
                result = "killed",
                pid = browser.get_process_id(),
                "Chrome process dropped without terminate; killing it"
            );
            drop(browser);
        }
    }
}

pub struct ChromePage {
    tab: Arc<Tab>,
    // Removed from disk when the page goes away.
    document: Option<NamedTempFile>,
}

#[async_trait]
impl EnginePage for ChromePage {
    async fn load_html(&mut self, html: &str) -> Result<(), RenderError> {
        let mut file = tempfile::Builder::new()
            .prefix("bakehouse-")
            .suffix(".html")
            .tempfile()
            .map_err(|err| RenderError::process(EngineStage::Load, err.to_string()))?;
        file.write_all(html.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|err| RenderError::process(EngineStage::Load, err.to_string()))?;

        let url = document_url(file.path())?;
        self.document = Some(file);

        let tab = Arc::clone(&self.tab);
        blocking(EngineStage::Load, move || {
            tab.navigate_to(url.as_str())
                .and_then(|tab| tab.wait_until_navigated())
                .map(|_| ())
                .map_err(|err| err.to_string())
        })
        .await
    }

    /// Settled means the document, its `<img>` elements and its fonts have
    /// finished loading. Fetch/XHR requests and CSS `url()` backgrounds are
    /// not observed.
    async fn wait_for_network_idle(&mut self) -> Result<(), RenderError> {
        let mut settled_since: Option<Instant> = None;

        loop {
            let tab = Arc::clone(&self.tab);
            let settled = blocking(EngineStage::Load, move || {
                tab.evaluate(SETTLED_CHECK, false)
                    .map(|object| {
                        object
                            .value
                            .and_then(|value| value.as_bool())
                            .unwrap_or(false)
                    })
                    .map_err(|err| err.to_string())
            })
            .await?;

            match (settled, settled_since) {
                (true, Some(since)) if since.elapsed() >= IDLE_QUIET_PERIOD => return Ok(()),
                (true, None) => settled_since = Some(Instant::now()),
                (true, Some(_)) => {}
                (false, _) => settled_since = None,
            }

            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    async fn print_pdf(&mut self, layout: &LayoutOptions) -> Result<Vec<u8>, RenderError> {
        let options = print_options(layout);
        let tab = Arc::clone(&self.tab);

        blocking(EngineStage::Print, move || {
            tab.print_to_pdf(Some(options))
                .map_err(|err| err.to_string())
        })
        .await
    }
}

fn document_url(path: &Path) -> Result<Url, RenderError> {
    Url::from_file_path(path).map_err(|()| {
        RenderError::process(
            EngineStage::Load,
            format!("`{}` is not an absolute file path", path.display()),
        )
    })
}

pub(crate) fn print_options(layout: &LayoutOptions) -> PrintToPdfOptions {
    let (paper_width, paper_height) = layout.page_format.dimensions_in();
    let header_footer = layout.header_footer.as_ref();

    PrintToPdfOptions {
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: Some(px_to_in(layout.margins.top)),
        margin_right: Some(px_to_in(layout.margins.right)),
        margin_bottom: Some(px_to_in(layout.margins.bottom)),
        margin_left: Some(px_to_in(layout.margins.left)),
        print_background: Some(layout.print_background),
        display_header_footer: Some(header_footer.is_some()),
        header_template: header_footer.map(|fragments| fragments.resolved_header().to_string()),
        footer_template: header_footer.map(|fragments| fragments.resolved_footer().to_string()),
        prefer_css_page_size: Some(false),
        ..PrintToPdfOptions::default()
    }
}

fn px_to_in(px: u32) -> f64 {
    f64::from(px) / CSS_PX_PER_INCH
}

/// Run a synchronous DevTools call on the blocking pool and tag failures with
/// the lifecycle stage they happened in.
async fn blocking<T, F>(stage: EngineStage, task: F) -> Result<T, RenderError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, String> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(message)) => Err(RenderError::process(stage, message)),
        Err(err) => Err(RenderError::process(
            stage,
            format!("blocking task did not complete: {err}"),
        )),
    }
}
