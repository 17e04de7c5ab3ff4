//! Shared error types, tool configuration and per-invocation context for the CLI.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

use rhc_clients::{
    CommandRunner, InsightsClient, SubscriptionManager, SystemdUnit, TokioCommandRunner,
};
use rhc_core::Clients;
use rhc_telemetry::LogLevel;

use crate::cli::OutputFormat;
use crate::output::Theme;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
    /// The failure has already been rendered to stdout.
    Reported,
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Failure(_) | Self::Reported => 1,
        }
    }

    /// Message for stderr; `None` when nothing more should be printed.
    pub(crate) fn display_message(&self) -> Option<String> {
        match self {
            Self::Validation(message) => Some(message.clone()),
            Self::Failure(error) => Some(format!("{error:#}")),
            Self::Reported => None,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Host tool locations, from flags or their environment fallbacks.
#[derive(Debug, Clone)]
pub(crate) struct ToolConfig {
    pub(crate) subscription_manager: String,
    pub(crate) insights_client: String,
    pub(crate) systemctl: String,
    pub(crate) daemon_unit: String,
    pub(crate) facts_root: PathBuf,
}

/// Production clients, one per subsystem, sharing a process runner.
pub(crate) struct HostClients {
    subscription: SubscriptionManager,
    telemetry: InsightsClient,
    daemon: SystemdUnit,
}

impl HostClients {
    pub(crate) fn new(tools: &ToolConfig) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner);
        Self {
            subscription: SubscriptionManager::new(
                Arc::clone(&runner),
                tools.subscription_manager.as_str(),
            ),
            telemetry: InsightsClient::new(Arc::clone(&runner), tools.insights_client.as_str()),
            daemon: SystemdUnit::new(runner, tools.systemctl.as_str(), tools.daemon_unit.as_str()),
        }
    }

    pub(crate) fn clients(&self) -> Clients<'_> {
        Clients {
            subscription: &self.subscription,
            telemetry: &self.telemetry,
            daemon: &self.daemon,
        }
    }
}

/// Presentation settings passed to command handlers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AppContext {
    pub(crate) theme: Theme,
    pub(crate) format: OutputFormat,
    pub(crate) log_level: LogLevel,
}

impl AppContext {
    pub(crate) const fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Whether per-step timing tables are printed.
    pub(crate) const fn show_timings(&self) -> bool {
        !self.is_json() && self.log_level.is_debug()
    }
}
