//! In-memory subsystem clients that record every call.
//!
//! All fakes of one [`FakeHost`] share a [`CallLog`], so tests can assert the
//! cross-subsystem order of calls as well as which calls never happened.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rhc_core::{
    ClientError, ClientResult, Clients, DaemonClient, SubscriptionClient, TelemetryClient,
};

/// Registration identifier assigned by [`FakeSubscription`] on register.
pub const REGISTERED_ID: &str = "6f1c5a3e-1d2b-4a9f-9b61-5d2e0c7e4f10";

/// Shared, ordered record of client calls (`"<label>.<operation>"`).
#[derive(Clone, Debug, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Append a call.
    pub fn record(&self, call: impl Into<String>) {
        lock(&self.0).push(call.into());
    }

    /// Snapshot of the calls made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.0).clone()
    }

    /// Whether any call starts with `prefix`.
    #[must_use]
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        lock(&self.0).iter().any(|call| call.starts_with(prefix))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A non-zero exit from a host tool.
#[must_use]
pub fn tool_failure(program: &str, operation: &'static str, stderr: &str) -> ClientError {
    ClientError::CommandFailed {
        program: program.to_string(),
        operation,
        code: Some(1),
        stderr: stderr.to_string(),
    }
}

/// A host tool that is not installed.
#[must_use]
pub fn tool_missing(program: &str) -> ClientError {
    ClientError::ToolNotFound {
        program: program.to_string(),
    }
}

/// Fake subscription client with an in-memory registration identifier.
#[derive(Debug)]
pub struct FakeSubscription {
    log: CallLog,
    registration_id: Mutex<String>,
    failing: Vec<&'static str>,
}

impl FakeSubscription {
    /// Unregistered host that records into `log`.
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            registration_id: Mutex::new(String::new()),
            failing: Vec::new(),
        }
    }

    /// Start out registered with `id`.
    #[must_use]
    pub fn registered(self, id: &str) -> Self {
        *lock(&self.registration_id) = id.to_string();
        self
    }

    /// Make `operation` (`registration_id`, `register`, `unregister`) fail.
    #[must_use]
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.push(operation);
        self
    }

    /// Current registration identifier.
    #[must_use]
    pub fn current_id(&self) -> String {
        lock(&self.registration_id).clone()
    }

    fn call(&self, operation: &'static str) -> ClientResult<()> {
        self.log.record(format!("rhsm.{operation}"));
        if self.failing.iter().any(|failing| operation.starts_with(failing)) {
            return Err(tool_failure(
                "subscription-manager",
                operation,
                "Invalid username or password.",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionClient for FakeSubscription {
    async fn registration_id(&self) -> ClientResult<String> {
        self.call("registration_id")?;
        Ok(self.current_id())
    }

    async fn register_with_activation_key(
        &self,
        organization: &str,
        activation_keys: &[String],
        _server: Option<&str>,
    ) -> ClientResult<()> {
        self.call("register_with_activation_key")?;
        self.log.record(format!(
            "rhsm.activation_key:{organization}:{}",
            activation_keys.join(",")
        ));
        *lock(&self.registration_id) = REGISTERED_ID.to_string();
        Ok(())
    }

    async fn register_with_password(
        &self,
        username: &str,
        _password: &str,
        _server: Option<&str>,
    ) -> ClientResult<()> {
        self.call("register_with_password")?;
        self.log.record(format!("rhsm.password:{username}"));
        *lock(&self.registration_id) = REGISTERED_ID.to_string();
        Ok(())
    }

    async fn unregister(&self) -> ClientResult<()> {
        self.call("unregister")?;
        lock(&self.registration_id).clear();
        Ok(())
    }
}

/// Fake Insights client.
#[derive(Debug)]
pub struct FakeTelemetry {
    log: CallLog,
    registered: Mutex<bool>,
    failing: Vec<&'static str>,
    tool_missing: bool,
}

impl FakeTelemetry {
    /// Unregistered Insights client that records into `log`.
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            registered: Mutex::new(false),
            failing: Vec::new(),
            tool_missing: false,
        }
    }

    /// Start out registered.
    #[must_use]
    pub fn registered(self) -> Self {
        *lock(&self.registered) = true;
        self
    }

    /// Make `operation` (`is_registered`, `register`, `unregister`) fail.
    #[must_use]
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.push(operation);
        self
    }

    /// Behave as if `insights-client` is not installed.
    #[must_use]
    pub fn without_tool(mut self) -> Self {
        self.tool_missing = true;
        self
    }

    /// Current registration state.
    #[must_use]
    pub fn is_registered_now(&self) -> bool {
        *lock(&self.registered)
    }

    fn call(&self, operation: &'static str) -> ClientResult<()> {
        self.log.record(format!("insights.{operation}"));
        if self.tool_missing {
            return Err(tool_missing("insights-client"));
        }
        if self.failing.contains(&operation) {
            return Err(tool_failure("insights-client", operation, "upload failed"));
        }
        Ok(())
    }
}

#[async_trait]
impl TelemetryClient for FakeTelemetry {
    async fn is_registered(&self) -> ClientResult<bool> {
        self.call("is_registered")?;
        Ok(self.is_registered_now())
    }

    async fn register(&self) -> ClientResult<()> {
        self.call("register")?;
        *lock(&self.registered) = true;
        Ok(())
    }

    async fn unregister(&self) -> ClientResult<()> {
        self.call("unregister")?;
        *lock(&self.registered) = false;
        Ok(())
    }
}

/// Fake daemon unit.
#[derive(Debug)]
pub struct FakeDaemon {
    log: CallLog,
    state: Mutex<String>,
    failing: Vec<&'static str>,
}

impl FakeDaemon {
    /// Inactive daemon that records into `log`.
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            state: Mutex::new("inactive".to_string()),
            failing: Vec::new(),
        }
    }

    /// Start out with `ActiveState` set to `state`.
    #[must_use]
    pub fn with_state(self, state: &str) -> Self {
        *lock(&self.state) = state.to_string();
        self
    }

    /// Make `operation` (`activate`, `deactivate`, `active_state`) fail.
    #[must_use]
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.push(operation);
        self
    }

    /// Current `ActiveState`.
    #[must_use]
    pub fn state(&self) -> String {
        lock(&self.state).clone()
    }

    fn call(&self, operation: &'static str) -> ClientResult<()> {
        self.log.record(format!("rhcd.{operation}"));
        if self.failing.contains(&operation) {
            return Err(tool_failure(
                "systemctl",
                operation,
                "Failed to connect to bus: No such file or directory",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DaemonClient for FakeDaemon {
    async fn activate(&self) -> ClientResult<()> {
        self.call("activate")?;
        *lock(&self.state) = "active".to_string();
        Ok(())
    }

    async fn deactivate(&self) -> ClientResult<()> {
        self.call("deactivate")?;
        *lock(&self.state) = "inactive".to_string();
        Ok(())
    }

    async fn active_state(&self) -> ClientResult<String> {
        self.call("active_state")?;
        Ok(self.state())
    }
}

/// One fake per subsystem sharing a single [`CallLog`].
#[derive(Debug)]
pub struct FakeHost {
    /// Shared call log.
    pub log: CallLog,
    /// Subscription fake.
    pub subscription: FakeSubscription,
    /// Insights fake.
    pub telemetry: FakeTelemetry,
    /// Daemon fake.
    pub daemon: FakeDaemon,
}

impl Default for FakeHost {
    fn default() -> Self {
        let log = CallLog::default();
        Self {
            subscription: FakeSubscription::new(log.clone()),
            telemetry: FakeTelemetry::new(log.clone()),
            daemon: FakeDaemon::new(log.clone()),
            log,
        }
    }
}

impl FakeHost {
    /// Replace the subscription fake; `configure` receives one bound to the shared log.
    #[must_use]
    pub fn subscription(mut self, configure: impl FnOnce(FakeSubscription) -> FakeSubscription) -> Self {
        self.subscription = configure(FakeSubscription::new(self.log.clone()));
        self
    }

    /// Replace the Insights fake; `configure` receives one bound to the shared log.
    #[must_use]
    pub fn telemetry(mut self, configure: impl FnOnce(FakeTelemetry) -> FakeTelemetry) -> Self {
        self.telemetry = configure(FakeTelemetry::new(self.log.clone()));
        self
    }

    /// Replace the daemon fake; `configure` receives one bound to the shared log.
    #[must_use]
    pub fn daemon(mut self, configure: impl FnOnce(FakeDaemon) -> FakeDaemon) -> Self {
        self.daemon = configure(FakeDaemon::new(self.log.clone()));
        self
    }

    /// Borrow the fakes as orchestrator clients.
    #[must_use]
    pub fn clients(&self) -> Clients<'_> {
        Clients {
            subscription: &self.subscription,
            telemetry: &self.telemetry,
            daemon: &self.daemon,
        }
    }

    /// Calls recorded so far, across all fakes.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.log.calls()
    }
}
