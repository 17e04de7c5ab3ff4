//! # Design
//!
//! - Split subsystem client failures (`ClientError`) from orchestration failures
//!   (`ConnectorError`) so the core can tag every client error with its step.
//! - Carry operation context as fields; the CLI walks `source()` chains for display.

use std::fmt::{self, Display, Formatter};
use std::io;

use thiserror::Error;

use crate::model::Subsystem;

/// Result alias for orchestration-level operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Result alias returned by subsystem clients.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures reported by a subsystem client implementation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The host tool backing the client is not installed.
    #[error("{program} not found")]
    ToolNotFound {
        /// Program that could not be spawned.
        program: String,
    },
    /// The host tool ran but reported failure.
    #[error("{program} {operation} exited with {}: {}", exit_label(.code), .stderr.trim())]
    CommandFailed {
        /// Program that was executed.
        program: String,
        /// Client operation being performed.
        operation: &'static str,
        /// Exit code when the process was not killed by a signal.
        code: Option<i32>,
        /// Captured diagnostic output.
        stderr: String,
    },
    /// The host tool succeeded but its output could not be interpreted.
    #[error("{program} {operation} returned unexpected output")]
    UnexpectedOutput {
        /// Program that was executed.
        program: String,
        /// Client operation being performed.
        operation: &'static str,
        /// Raw output that failed to parse.
        output: String,
    },
    /// Spawning or waiting on the host tool failed.
    #[error("failed to execute {program}")]
    Io {
        /// Program that was executed.
        program: String,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl ClientError {
    /// Whether the failure means the backing tool is missing from the host.
    #[must_use]
    pub const fn is_tool_missing(&self) -> bool {
        matches!(self, Self::ToolNotFound { .. })
    }
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |code| format!("status {code}"))
}

/// A client failure tagged with the subsystem and operation it belongs to.
#[derive(Debug)]
pub struct SubsystemError {
    /// Subsystem whose client failed.
    pub subsystem: Subsystem,
    /// Operation that was attempted (for example `register`).
    pub operation: &'static str,
    /// Underlying client failure.
    pub source: ClientError,
}

impl SubsystemError {
    /// Tag a client failure with its subsystem and operation.
    #[must_use]
    pub const fn new(subsystem: Subsystem, operation: &'static str, source: ClientError) -> Self {
        Self {
            subsystem,
            operation,
            source,
        }
    }
}

impl Display for SubsystemError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "cannot {} {}",
            self.operation,
            self.subsystem.display_name()
        )
    }
}

impl std::error::Error for SubsystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Errors that abort a command before or during orchestration.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Interactive credential input could not be read.
    #[error("failed to read {field}")]
    Credential {
        /// Credential field being prompted for.
        field: &'static str,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A subsystem client call failed where failure is fatal.
    #[error(transparent)]
    Subsystem(#[from] SubsystemError),
    /// Host level IO failed (hostname lookup, fact files).
    #[error("{operation} failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl ConnectorError {
    pub(crate) const fn credential(field: &'static str, source: io::Error) -> Self {
        Self::Credential { field, source }
    }

    /// Wrap a host IO failure.
    #[must_use]
    pub const fn io(operation: &'static str, source: io::Error) -> Self {
        Self::Io { operation, source }
    }
}
