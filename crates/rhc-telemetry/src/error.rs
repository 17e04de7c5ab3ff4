//! Error types for telemetry operations.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug)]
pub enum TelemetryError {
    /// Installing the tracing subscriber failed.
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A log level name was not recognised.
    InvalidLogLevel {
        /// Rejected input.
        value: String,
    },
    /// A log format name was not recognised.
    InvalidLogFormat {
        /// Rejected input.
        value: String,
    },
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriberInstall { .. } => {
                formatter.write_str("failed to install tracing subscriber")
            }
            Self::InvalidLogLevel { value } => write!(
                formatter,
                "unsupported log level '{value}' (expected error, warn, info, debug or trace)"
            ),
            Self::InvalidLogFormat { value } => write!(
                formatter,
                "unsupported log format '{value}' (expected pretty or json)"
            ),
        }
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SubscriberInstall { source } => Some(source),
            Self::InvalidLogLevel { .. } | Self::InvalidLogFormat { .. } => None,
        }
    }
}
