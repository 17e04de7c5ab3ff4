//! Status aggregation across the three subsystems.

use tracing::{debug, warn};

use crate::client::Clients;
use crate::error::{ConnectorResult, SubsystemError};
use crate::model::{StatusSnapshot, Subsystem, TelemetryState};
use crate::orchestrator::NoopObserver;

/// `ActiveState` value reported for a running daemon unit.
pub const ACTIVE_STATE: &str = "active";

/// Receives each subsystem's state as soon as it is resolved.
///
/// A fatal query error ends the run, but states resolved before it have
/// already been delivered.
pub trait StatusObserver: Send + Sync {
    /// Called before the query for `subsystem` starts.
    fn query_started(&self, subsystem: Subsystem) {
        let _ = subsystem;
    }

    /// Subscription registration resolved.
    fn subscription_resolved(&self, connected: bool) {
        let _ = connected;
    }

    /// Insights registration resolved, possibly as [`TelemetryState::Unknown`].
    fn telemetry_resolved(&self, state: &TelemetryState) {
        let _ = state;
    }

    /// Daemon `ActiveState` resolved.
    fn daemon_resolved(&self, active: bool, state: &str) {
        let _ = (active, state);
    }
}

impl StatusObserver for NoopObserver {}

/// Queries each subsystem once and assembles a [`StatusSnapshot`].
///
/// Subscription and daemon queries are preconditions: their failures abort.
/// The Insights checker is an optional tool, so its failures are reported in
/// the snapshot as [`TelemetryState::Unknown`] instead.
pub struct StatusAggregator<'a> {
    clients: Clients<'a>,
}

impl<'a> StatusAggregator<'a> {
    /// Aggregate over the given clients.
    #[must_use]
    pub const fn new(clients: Clients<'a>) -> Self {
        Self { clients }
    }

    /// Resolve the current state of every subsystem.
    ///
    /// # Errors
    ///
    /// Returns a subsystem error when the subscription or daemon query fails.
    pub async fn status(&self) -> ConnectorResult<StatusSnapshot> {
        self.observe(&NoopObserver).await
    }

    /// Resolve every subsystem, reporting each state to `observer` as it is known.
    ///
    /// # Errors
    ///
    /// Returns a subsystem error when the subscription or daemon query fails.
    pub async fn observe(
        &self,
        observer: &dyn StatusObserver,
    ) -> ConnectorResult<StatusSnapshot> {
        observer.query_started(Subsystem::Subscription);
        let registration_id = self
            .clients
            .subscription
            .registration_id()
            .await
            .map_err(|source| SubsystemError::new(Subsystem::Subscription, "query", source))?;
        let subscription_connected = !registration_id.trim().is_empty();
        debug!(subscription_connected, "subscription state resolved");
        observer.subscription_resolved(subscription_connected);

        observer.query_started(Subsystem::Telemetry);
        let telemetry = match self.clients.telemetry.is_registered().await {
            Ok(true) => TelemetryState::Connected,
            Ok(false) => TelemetryState::Disconnected,
            Err(err) => {
                warn!(error = %err, "insights registration check failed");
                TelemetryState::Unknown(err)
            }
        };
        observer.telemetry_resolved(&telemetry);

        observer.query_started(Subsystem::Daemon);
        let daemon_state = self
            .clients
            .daemon
            .active_state()
            .await
            .map_err(|source| SubsystemError::new(Subsystem::Daemon, "query", source))?;
        let daemon_state = daemon_state.trim().to_string();
        let daemon_active = daemon_state == ACTIVE_STATE;
        debug!(daemon_state = %daemon_state, "daemon state resolved");
        observer.daemon_resolved(daemon_active, &daemon_state);

        Ok(StatusSnapshot {
            subscription_connected,
            telemetry,
            daemon_active,
            daemon_state,
        })
    }
}
