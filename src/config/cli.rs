use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::application::documents::DocumentKind;

/// Command-line arguments for the bakehouse binary.
#[derive(Debug, Parser)]
#[command(
    name = "bakehouse",
    version,
    about = "Bakery order documents and ingredient catalog"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "BAKEHOUSE_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SettingsOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render one document from a JSON input file to a PDF file.
    Render(RenderArgs),
    /// Seed an empty ingredient catalog and print it as JSON.
    #[command(name = "seed-catalog")]
    SeedCatalog,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Document kind: single_order, label_sheet, shipping_manifest or commission_report.
    #[arg(long, value_name = "KIND")]
    pub kind: DocumentKind,

    /// JSON file with one order (single_order) or a list of records.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Destination of the generated PDF.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Report date printed on commission reports.
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SettingsOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the Chrome or Chromium executable used for printing.
    #[arg(long = "chrome-path", value_name = "PATH", global = true)]
    pub chrome_path: Option<PathBuf>,

    /// Override how long a document may take to settle before printing.
    #[arg(long = "render-max-wait-ms", value_name = "MS", global = true)]
    pub render_max_wait_ms: Option<u64>,

    /// Override the timezone used for receipt timestamps.
    #[arg(long = "render-timezone", value_name = "TZ", global = true)]
    pub render_timezone: Option<String>,

    /// Cap the number of browser processes alive at once.
    #[arg(long = "render-max-concurrent", value_name = "COUNT", global = true)]
    pub render_max_concurrent: Option<usize>,
}
