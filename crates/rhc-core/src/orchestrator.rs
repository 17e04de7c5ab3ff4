//! Connect and disconnect sequencing across the three subsystems.
//!
//! # Design
//! - Each run is a list of planned steps (lazy boxed futures) fed to one
//!   [`StepRunner`]; a step's client call only starts when the runner polls it.
//! - What happens after a failed step is decided by a [`StepPolicy`]:
//!   [`FailFast`] for connect, [`BestEffort`] for disconnect.
//! - Results are appended in execution order; nothing is rolled back.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use crate::client::{Clients, SubscriptionClient};
use crate::error::{ClientError, SubsystemError};
use crate::model::{
    ConnectOutcome, Credentials, DisconnectOutcome, StepAction, StepNote, StepResult, Subsystem,
};

type StepFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<StepNote>, SubsystemError>> + Send + 'a>>;

/// Receives progress notifications while a run is in flight.
pub trait StepObserver: Send + Sync {
    /// Called before a step's client call starts.
    fn step_started(&self, subsystem: Subsystem, action: StepAction) {
        let _ = (subsystem, action);
    }

    /// Called once a step has produced its result.
    fn step_finished(&self, result: &StepResult, action: StepAction) {
        let _ = (result, action);
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {}

/// Whether a run proceeds after a failed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Attempt the remaining steps.
    Continue,
    /// Stop; remaining steps are never started.
    Stop,
}

/// Failure handling strategy applied by a [`StepRunner`].
pub trait StepPolicy {
    /// Decide how to proceed after `failed`.
    fn after_failure(&self, failed: &StepResult) -> Flow;
}

/// Stop at the first failed step.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailFast;

impl StepPolicy for FailFast {
    fn after_failure(&self, _failed: &StepResult) -> Flow {
        Flow::Stop
    }
}

/// Keep going past failed steps.
#[derive(Debug, Default, Clone, Copy)]
pub struct BestEffort;

impl StepPolicy for BestEffort {
    fn after_failure(&self, _failed: &StepResult) -> Flow {
        Flow::Continue
    }
}

/// A subsystem step waiting to be run.
pub struct PlannedStep<'a> {
    subsystem: Subsystem,
    run: StepFuture<'a>,
}

impl<'a> PlannedStep<'a> {
    /// Plan `operation` against `subsystem`; `call` is not polled until the step runs.
    pub fn new<F>(subsystem: Subsystem, operation: &'static str, call: F) -> Self
    where
        F: Future<Output = Result<Option<StepNote>, ClientError>> + Send + 'a,
    {
        Self {
            subsystem,
            run: Box::pin(async move {
                call.await
                    .map_err(|source| SubsystemError::new(subsystem, operation, source))
            }),
        }
    }

    fn from_future(subsystem: Subsystem, run: StepFuture<'a>) -> Self {
        Self { subsystem, run }
    }
}

/// Steps executed by a [`StepRunner`] and whether the policy stopped early.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Results in execution order.
    pub steps: Vec<StepResult>,
    /// Whether the policy stopped the run after a failure.
    pub stopped: bool,
}

/// Runs planned steps one at a time, timing each and consulting its policy on failure.
pub struct StepRunner<'o, P> {
    policy: P,
    action: StepAction,
    observer: &'o dyn StepObserver,
}

impl<'o, P: StepPolicy> StepRunner<'o, P> {
    /// Build a runner for `action` that reports progress to `observer`.
    pub const fn new(policy: P, action: StepAction, observer: &'o dyn StepObserver) -> Self {
        Self {
            policy,
            action,
            observer,
        }
    }

    /// Execute `steps` strictly in order.
    pub async fn run(&self, steps: Vec<PlannedStep<'_>>) -> RunReport {
        let mut report = RunReport::default();

        for step in steps {
            let subsystem = step.subsystem;
            self.observer.step_started(subsystem, self.action);

            let started = Instant::now();
            let span = info_span!("step", subsystem = subsystem.label(), action = ?self.action);
            let outcome = step.run.instrument(span).await;
            let elapsed = started.elapsed();
            let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

            let result = match outcome {
                Ok(note) => {
                    info!(subsystem = subsystem.label(), duration_ms, "step completed");
                    StepResult::completed(subsystem, elapsed, note)
                }
                Err(error) => {
                    warn!(
                        subsystem = subsystem.label(),
                        operation = error.operation,
                        error = %error.source,
                        duration_ms,
                        "step failed"
                    );
                    StepResult::failed(error, elapsed)
                }
            };

            self.observer.step_finished(&result, self.action);
            let flow = if result.succeeded() {
                Flow::Continue
            } else {
                self.policy.after_failure(&result)
            };
            report.steps.push(result);

            if flow == Flow::Stop {
                report.stopped = true;
                break;
            }
        }

        report
    }
}

/// Sequences connect and disconnect runs over one client per subsystem.
pub struct Orchestrator<'a> {
    clients: Clients<'a>,
}

impl<'a> Orchestrator<'a> {
    /// Orchestrate over the given clients.
    #[must_use]
    pub const fn new(clients: Clients<'a>) -> Self {
        Self { clients }
    }

    /// Connect Subscription, then Telemetry, then Daemon; stop at the first failure.
    ///
    /// An existing subscription registration is reused rather than replaced,
    /// so connecting an already connected host is safe.
    pub async fn connect(
        &self,
        credentials: &Credentials,
        observer: &dyn StepObserver,
    ) -> ConnectOutcome {
        let Clients {
            subscription,
            telemetry,
            daemon,
        } = self.clients;

        let steps = vec![
            PlannedStep::from_future(
                Subsystem::Subscription,
                Box::pin(connect_subscription(subscription, credentials)),
            ),
            PlannedStep::new(Subsystem::Telemetry, "connect to", async move {
                telemetry.register().await.map(|()| None)
            }),
            PlannedStep::new(Subsystem::Daemon, "activate", async move {
                daemon.activate().await.map(|()| None)
            }),
        ];

        let report = StepRunner::new(FailFast, StepAction::Connect, observer)
            .run(steps)
            .await;

        ConnectOutcome {
            steps: report.steps,
            aborted: report.stopped,
        }
    }

    /// Deactivate Daemon, unregister Telemetry, unregister Subscription;
    /// every step is attempted regardless of earlier failures.
    pub async fn disconnect(&self, observer: &dyn StepObserver) -> DisconnectOutcome {
        let Clients {
            subscription,
            telemetry,
            daemon,
        } = self.clients;

        let steps = vec![
            PlannedStep::new(Subsystem::Daemon, "deactivate", async move {
                daemon.deactivate().await.map(|()| None)
            }),
            PlannedStep::new(Subsystem::Telemetry, "disconnect from", async move {
                telemetry.unregister().await.map(|()| None)
            }),
            PlannedStep::new(Subsystem::Subscription, "disconnect from", async move {
                subscription.unregister().await.map(|()| None)
            }),
        ];

        let report = StepRunner::new(BestEffort, StepAction::Disconnect, observer)
            .run(steps)
            .await;

        DisconnectOutcome {
            steps: report.steps,
        }
    }
}

async fn connect_subscription(
    subscription: &dyn SubscriptionClient,
    credentials: &Credentials,
) -> Result<Option<StepNote>, SubsystemError> {
    let id = subscription
        .registration_id()
        .await
        .map_err(|source| SubsystemError::new(Subsystem::Subscription, "query", source))?;
    if !id.trim().is_empty() {
        info!(registration_id = %id.trim(), "host already registered");
        return Ok(Some(StepNote::AlreadyConnected));
    }

    let registered = match credentials {
        Credentials::ActivationKey {
            organization,
            activation_keys,
            server,
        } => {
            subscription
                .register_with_activation_key(organization, activation_keys, server.as_deref())
                .await
        }
        Credentials::Password {
            username,
            password,
            server,
        } => {
            subscription
                .register_with_password(username, password, server.as_deref())
                .await
        }
    };

    registered
        .map(|()| None)
        .map_err(|source| SubsystemError::new(Subsystem::Subscription, "connect to", source))
}
