//! Value types produced and consumed by the orchestrators.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use serde::Serialize;

use crate::error::{ClientError, SubsystemError};

/// The three subsystems a host is connected to, in connect order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    /// Subscription management (registration identity).
    Subscription,
    /// Insights telemetry agent.
    Telemetry,
    /// Local management daemon.
    Daemon,
}

impl Subsystem {
    /// Short, stable label used in tables, JSON and log fields.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Subscription => "rhsm",
            Self::Telemetry => "insights",
            Self::Daemon => "rhcd",
        }
    }

    /// Human readable name used in rendered messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Subscription => "Red Hat Subscription Management",
            Self::Telemetry => "Red Hat Insights",
            Self::Daemon => "the rhc daemon",
        }
    }
}

/// Credentials used to register the host with subscription management.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Organization identifier plus one or more activation keys.
    ActivationKey {
        /// Organization identifier.
        organization: String,
        /// Activation keys in the order supplied.
        activation_keys: Vec<String>,
        /// Optional override of the registration server URL.
        server: Option<String>,
    },
    /// Account username and password.
    Password {
        /// Account username.
        username: String,
        /// Account password.
        password: String,
        /// Optional override of the registration server URL.
        server: Option<String>,
    },
}

impl Credentials {
    /// Server override shared by both credential shapes.
    #[must_use]
    pub fn server(&self) -> Option<&str> {
        match self {
            Self::ActivationKey { server, .. } | Self::Password { server, .. } => server.as_deref(),
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActivationKey {
                organization,
                activation_keys,
                server,
            } => formatter
                .debug_struct("ActivationKey")
                .field("organization", organization)
                .field("activation_keys", activation_keys)
                .field("server", server)
                .finish(),
            Self::Password {
                username, server, ..
            } => formatter
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("server", server)
                .finish(),
        }
    }
}

/// What an orchestrator is doing to a subsystem during a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepAction {
    /// Establishing the connection.
    Connect,
    /// Tearing the connection down.
    Disconnect,
}

/// Extra information about how a successful step was satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepNote {
    /// The subsystem was already in the requested state; nothing was changed.
    AlreadyConnected,
}

/// Outcome of a single subsystem step.
#[derive(Debug)]
pub struct StepResult {
    subsystem: Subsystem,
    error: Option<SubsystemError>,
    duration: Duration,
    note: Option<StepNote>,
}

impl StepResult {
    /// Record a successful step.
    #[must_use]
    pub const fn completed(
        subsystem: Subsystem,
        duration: Duration,
        note: Option<StepNote>,
    ) -> Self {
        Self {
            subsystem,
            error: None,
            duration,
            note,
        }
    }

    /// Record a failed step; the subsystem is taken from the error.
    #[must_use]
    pub const fn failed(error: SubsystemError, duration: Duration) -> Self {
        Self {
            subsystem: error.subsystem,
            error: Some(error),
            duration,
            note: None,
        }
    }

    /// Subsystem the step acted on.
    #[must_use]
    pub const fn subsystem(&self) -> Subsystem {
        self.subsystem
    }

    /// Whether the step completed without error.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Failure recorded for the step, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&SubsystemError> {
        self.error.as_ref()
    }

    /// Wall-clock time spent in the step.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Additional detail for successful steps.
    #[must_use]
    pub const fn note(&self) -> Option<StepNote> {
        self.note
    }

    /// Take the recorded failure, if any.
    #[must_use]
    pub fn into_error(self) -> Option<SubsystemError> {
        self.error
    }
}

/// Result of a fail-fast connect run.
#[derive(Debug, Default)]
pub struct ConnectOutcome {
    /// Steps in execution order; stops at the first failure.
    pub steps: Vec<StepResult>,
    /// Whether the run stopped before every step was attempted.
    pub aborted: bool,
}

impl ConnectOutcome {
    /// Whether all steps ran and succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.aborted && self.steps.iter().all(StepResult::succeeded)
    }

    /// The failure that aborted the run, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&SubsystemError> {
        self.steps.iter().find_map(StepResult::error)
    }

    /// Take the failure that aborted the run, if any.
    #[must_use]
    pub fn into_failure(self) -> Option<SubsystemError> {
        self.steps.into_iter().find_map(StepResult::into_error)
    }
}

/// Result of a best-effort disconnect run.
#[derive(Debug, Default)]
pub struct DisconnectOutcome {
    /// Every attempted step in execution order.
    pub steps: Vec<StepResult>,
}

impl DisconnectOutcome {
    /// Failures keyed by subsystem, in step order.
    pub fn errors(&self) -> impl Iterator<Item = (Subsystem, &SubsystemError)> {
        self.steps
            .iter()
            .filter_map(|step| step.error().map(|error| (step.subsystem(), error)))
    }

    /// Failure recorded for the given subsystem, if any.
    #[must_use]
    pub fn error_for(&self, subsystem: Subsystem) -> Option<&SubsystemError> {
        self.errors()
            .find(|(failed, _)| *failed == subsystem)
            .map(|(_, error)| error)
    }

    /// Whether every step succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors().next().is_none()
    }
}

/// Telemetry registration state; the checker itself may fail.
#[derive(Debug)]
pub enum TelemetryState {
    /// Registered with Insights.
    Connected,
    /// Not registered with Insights.
    Disconnected,
    /// The registration check could not be completed.
    Unknown(ClientError),
}

impl TelemetryState {
    /// Whether the host is known to be registered.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Independently resolved connection state of each subsystem.
#[derive(Debug)]
pub struct StatusSnapshot {
    /// Host has a subscription registration identity.
    pub subscription_connected: bool,
    /// Insights registration state.
    pub telemetry: TelemetryState,
    /// Daemon unit reports `active`.
    pub daemon_active: bool,
    /// Raw `ActiveState` reported for the daemon unit.
    pub daemon_state: String,
}
