//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{ffi::OsString, num::NonZeroUsize, path::PathBuf, str::FromStr};

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::documents::{
    BuilderSettings, DEFAULT_FALLBACK_USERNAME, DEFAULT_MAX_WAIT_MS, DEFAULT_TIMEZONE,
};

pub use cli::{CliArgs, Command, RenderArgs, SettingsOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "bakehouse";
const ENV_PREFIX: &str = "BAKEHOUSE";
/// Conventional variable naming the browser binary, honoured when no
/// explicit `render.chrome_path` is configured.
pub const CHROME_PATH_ENV: &str = "CHROME_PATH";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// `None` lets the engine locate an installed browser.
    pub chrome_path: Option<PathBuf>,
    pub max_wait_ms: u64,
    pub timezone: Tz,
    pub max_concurrent_renders: Option<NonZeroUsize>,
    pub fallback_username: String,
}

impl RenderSettings {
    pub fn builder_settings(&self) -> BuilderSettings {
        BuilderSettings {
            max_wait_ms: self.max_wait_ms,
            timezone: self.timezone,
            fallback_username: self.fallback_username.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_chrome_path_fallback(std::env::var_os(CHROME_PATH_ENV));
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
}

impl RawSettings {
    fn apply_chrome_path_fallback(&mut self, env_value: Option<OsString>) {
        if self.render.chrome_path.is_some() {
            return;
        }
        self.render.chrome_path = env_value
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
    }

    fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(path) = overrides.chrome_path.as_ref() {
            self.render.chrome_path = Some(path.clone());
        }
        if let Some(wait) = overrides.render_max_wait_ms {
            self.render.max_wait_ms = Some(wait);
        }
        if let Some(timezone) = overrides.render_timezone.as_ref() {
            self.render.timezone = Some(timezone.clone());
        }
        if let Some(limit) = overrides.render_max_concurrent {
            self.render.max_concurrent_renders = Some(limit);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        Ok(Self {
            logging: build_logging_settings(raw.logging)?,
            render: build_render_settings(raw.render)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let chrome_path = match render.chrome_path {
        Some(path) if path.as_os_str().is_empty() => {
            return Err(LoadError::invalid(
                "render.chrome_path",
                "path must not be empty",
            ));
        }
        other => other,
    };

    let max_wait_ms = render.max_wait_ms.unwrap_or(DEFAULT_MAX_WAIT_MS);
    if max_wait_ms == 0 {
        return Err(LoadError::invalid(
            "render.max_wait_ms",
            "must be greater than zero",
        ));
    }

    let timezone = match render.timezone {
        Some(name) => Tz::from_str(name.trim()).map_err(|err| {
            LoadError::invalid("render.timezone", format!("unknown timezone `{name}`: {err}"))
        })?,
        None => DEFAULT_TIMEZONE,
    };

    let max_concurrent_renders = match render.max_concurrent_renders {
        Some(limit) => Some(NonZeroUsize::new(limit).ok_or_else(|| {
            LoadError::invalid("render.max_concurrent_renders", "must be greater than zero")
        })?),
        None => None,
    };

    let fallback_username = match render.fallback_username {
        Some(name) if name.trim().is_empty() => {
            return Err(LoadError::invalid(
                "render.fallback_username",
                "must not be blank",
            ));
        }
        Some(name) => name.trim().to_string(),
        None => DEFAULT_FALLBACK_USERNAME.to_string(),
    };

    Ok(RenderSettings {
        chrome_path,
        max_wait_ms,
        timezone,
        max_concurrent_renders,
        fallback_username,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    chrome_path: Option<PathBuf>,
    max_wait_ms: Option<u64>,
    timezone: Option<String>,
    max_concurrent_renders: Option<usize>,
    fallback_username: Option<String>,
}
