//! Logging initialisation and configuration.
//!
//! # Design
//! - One entry point installs the fmt subscriber (pretty or JSON) on stderr,
//!   leaving stdout to command output.
//! - `RUST_LOG` overrides the configured level when it is set.
//! - The build identifier is recorded once and read back by the context span.

use std::fmt::{Display, Formatter};
use std::io;
use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the tracing subscriber cannot be installed (for example,
/// because another subscriber has already been set globally).
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    BUILD_SHA.get_or_init(|| config.build_sha.to_string());
    install_fmt_subscriber(config)
}

/// Access the build identifier recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Most verbose level emitted.
    pub level: LogLevel,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Whether ANSI colour codes may be written.
    pub ansi: bool,
    /// Build identifier recorded in structured logs.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::Pretty,
            ansi: true,
            build_sha: build_sha(),
        }
    }
}

/// Verbosity threshold, from least to most verbose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Errors only.
    #[default]
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational progress.
    Info,
    /// Diagnostic detail, including per-step timings.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Filter directive name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Whether the level is `debug` or more verbose.
    #[must_use]
    pub const fn is_debug(self) -> bool {
        matches!(self, Self::Debug | Self::Trace)
    }
}

impl Display for LogLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = TelemetryError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(TelemetryError::InvalidLogLevel {
                value: value.to_string(),
            }),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable log lines.
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(TelemetryError::InvalidLogFormat {
                value: value.to_string(),
            }),
        }
    }
}

fn install_fmt_subscriber(config: &LoggingConfig<'_>) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_env_filter(config.level));
    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(config.ansi)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

fn build_env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}
