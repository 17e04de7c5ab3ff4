//! Capability traits for the three subsystems the orchestrators drive.
//!
//! Implementations live outside the core (`rhc-clients` drives the host
//! tools); the orchestrators only depend on these operations.

use async_trait::async_trait;

use crate::error::ClientResult;

/// Subscription management: registration identity of the host.
#[async_trait]
pub trait SubscriptionClient: Send + Sync {
    /// Current registration identifier; empty when the host is not registered.
    async fn registration_id(&self) -> ClientResult<String>;

    /// Register using an organization and activation keys.
    async fn register_with_activation_key(
        &self,
        organization: &str,
        activation_keys: &[String],
        server: Option<&str>,
    ) -> ClientResult<()>;

    /// Register using account credentials.
    async fn register_with_password(
        &self,
        username: &str,
        password: &str,
        server: Option<&str>,
    ) -> ClientResult<()>;

    /// Remove the host's registration.
    async fn unregister(&self) -> ClientResult<()>;
}

/// Insights telemetry agent registration.
#[async_trait]
pub trait TelemetryClient: Send + Sync {
    /// Whether the host is registered with Insights.
    async fn is_registered(&self) -> ClientResult<bool>;

    /// Register the host using its existing subscription identity.
    async fn register(&self) -> ClientResult<()>;

    /// Remove the Insights registration.
    async fn unregister(&self) -> ClientResult<()>;
}

/// Local management daemon lifecycle.
#[async_trait]
pub trait DaemonClient: Send + Sync {
    /// Enable and start the daemon.
    async fn activate(&self) -> ClientResult<()>;

    /// Stop and disable the daemon.
    async fn deactivate(&self) -> ClientResult<()>;

    /// The daemon unit's `ActiveState` (`"active"` when running).
    async fn active_state(&self) -> ClientResult<String>;
}

/// Borrowed handles to one client per subsystem.
#[derive(Clone, Copy)]
pub struct Clients<'a> {
    /// Subscription management client.
    pub subscription: &'a dyn SubscriptionClient,
    /// Insights client.
    pub telemetry: &'a dyn TelemetryClient,
    /// Daemon client.
    pub daemon: &'a dyn DaemonClient,
}
