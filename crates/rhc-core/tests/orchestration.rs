use std::sync::Mutex;

use rhc_core::{
    ConnectorError, CredentialFlags, CredentialResolver, Credentials, NoopObserver, Orchestrator,
    StatusAggregator, StatusObserver, StepNote, Subsystem, TelemetryState,
};
use rhc_test_support::fakes::{FakeDaemon, FakeHost, FakeTelemetry, REGISTERED_ID};
use rhc_test_support::prompt::ScriptedPrompter;

fn activation_key() -> Credentials {
    Credentials::ActivationKey {
        organization: "12345".into(),
        activation_keys: vec!["web".into(), "db".into()],
        server: None,
    }
}

fn subsystems(steps: &[rhc_core::StepResult]) -> Vec<Subsystem> {
    steps.iter().map(rhc_core::StepResult::subsystem).collect()
}

#[tokio::test]
async fn connect_registers_every_subsystem_in_order() {
    let host = FakeHost::default();
    let outcome = Orchestrator::new(host.clients())
        .connect(&activation_key(), &NoopObserver)
        .await;

    assert!(outcome.is_success());
    assert!(!outcome.aborted);
    assert_eq!(
        subsystems(&outcome.steps),
        vec![Subsystem::Subscription, Subsystem::Telemetry, Subsystem::Daemon]
    );
    assert_eq!(
        host.calls(),
        vec![
            "rhsm.registration_id",
            "rhsm.register_with_activation_key",
            "rhsm.activation_key:12345:web,db",
            "insights.register",
            "rhcd.activate",
        ]
    );
    assert_eq!(host.subscription.current_id(), REGISTERED_ID);
    assert_eq!(host.daemon.state(), "active");
}

#[tokio::test]
async fn connect_reuses_existing_registration() {
    let host = FakeHost::default().subscription(|sub| sub.registered("existing-id"));
    let outcome = Orchestrator::new(host.clients())
        .connect(&activation_key(), &NoopObserver)
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.steps[0].note(), Some(StepNote::AlreadyConnected));
    assert!(!host.log.contains_prefix("rhsm.register"));
    assert!(host.log.contains_prefix("insights.register"));
    assert!(host.log.contains_prefix("rhcd.activate"));
    assert_eq!(host.subscription.current_id(), "existing-id");
}

#[tokio::test]
async fn connect_twice_is_idempotent() {
    let host = FakeHost::default();
    let orchestrator = Orchestrator::new(host.clients());
    let first = orchestrator.connect(&activation_key(), &NoopObserver).await;
    let second = orchestrator.connect(&activation_key(), &NoopObserver).await;

    assert!(first.is_success());
    assert!(second.is_success());
    assert_eq!(first.steps[0].note(), None);
    assert_eq!(second.steps[0].note(), Some(StepNote::AlreadyConnected));
    let registrations = host
        .calls()
        .iter()
        .filter(|call| call.as_str() == "rhsm.register_with_activation_key")
        .count();
    assert_eq!(registrations, 1);
}

#[tokio::test]
async fn connect_stops_after_telemetry_failure() {
    let host = FakeHost::default().telemetry(|insights| insights.failing("register"));
    let outcome = Orchestrator::new(host.clients())
        .connect(&activation_key(), &NoopObserver)
        .await;

    assert!(outcome.aborted);
    assert!(!outcome.is_success());
    assert_eq!(
        subsystems(&outcome.steps),
        vec![Subsystem::Subscription, Subsystem::Telemetry]
    );
    let failure = outcome.failure().expect("telemetry failure recorded");
    assert_eq!(failure.subsystem, Subsystem::Telemetry);
    assert_eq!(failure.to_string(), "cannot connect to Red Hat Insights");
    assert!(!host.log.contains_prefix("rhcd."));
}

#[tokio::test]
async fn connect_stops_when_subscription_registration_fails() {
    let host = FakeHost::default().subscription(|sub| sub.failing("register"));
    let outcome = Orchestrator::new(host.clients())
        .connect(&activation_key(), &NoopObserver)
        .await;

    assert!(outcome.aborted);
    assert_eq!(outcome.steps.len(), 1);
    assert!(!host.log.contains_prefix("insights."));
    assert!(!host.log.contains_prefix("rhcd."));
}

#[tokio::test]
async fn connect_reports_failed_registration_query() {
    let host = FakeHost::default().subscription(|sub| sub.failing("registration_id"));
    let outcome = Orchestrator::new(host.clients())
        .connect(&activation_key(), &NoopObserver)
        .await;

    let failure = outcome.failure().expect("query failure recorded");
    assert_eq!(failure.operation, "query");
    assert_eq!(host.calls(), vec!["rhsm.registration_id"]);
}

#[tokio::test]
async fn connect_aborts_when_only_the_daemon_fails() {
    let host = FakeHost::default().daemon(|daemon| daemon.failing("activate"));
    let outcome = Orchestrator::new(host.clients())
        .connect(&activation_key(), &NoopObserver)
        .await;

    assert!(outcome.aborted);
    assert_eq!(outcome.steps.len(), 3);
    assert_eq!(
        outcome.failure().map(|failure| failure.subsystem),
        Some(Subsystem::Daemon)
    );
}

#[tokio::test]
async fn disconnect_attempts_every_step_after_daemon_failure() {
    let host = FakeHost::default()
        .subscription(|sub| sub.registered("existing-id"))
        .telemetry(FakeTelemetry::registered)
        .daemon(|daemon| daemon.with_state("active").failing("deactivate"));
    let outcome = Orchestrator::new(host.clients())
        .disconnect(&NoopObserver)
        .await;

    assert_eq!(
        host.calls(),
        vec!["rhcd.deactivate", "insights.unregister", "rhsm.unregister"]
    );
    let failed: Vec<Subsystem> = outcome.errors().map(|(subsystem, _)| subsystem).collect();
    assert_eq!(failed, vec![Subsystem::Daemon]);
    assert!(outcome.error_for(Subsystem::Telemetry).is_none());
    assert!(!host.telemetry.is_registered_now());
    assert!(host.subscription.current_id().is_empty());
}

#[tokio::test]
async fn disconnect_reports_errors_exactly_for_failed_steps() {
    for mask in 0_u8..8 {
        let daemon_fails = mask & 0b001 != 0;
        let telemetry_fails = mask & 0b010 != 0;
        let subscription_fails = mask & 0b100 != 0;

        let host = FakeHost::default()
            .daemon(|daemon| {
                if daemon_fails {
                    daemon.failing("deactivate")
                } else {
                    daemon
                }
            })
            .telemetry(|insights| {
                if telemetry_fails {
                    insights.failing("unregister")
                } else {
                    insights
                }
            })
            .subscription(|sub| {
                if subscription_fails {
                    sub.failing("unregister")
                } else {
                    sub
                }
            });

        let outcome = Orchestrator::new(host.clients())
            .disconnect(&NoopObserver)
            .await;

        assert_eq!(outcome.steps.len(), 3, "mask {mask:03b}");
        assert_eq!(
            outcome.error_for(Subsystem::Daemon).is_some(),
            daemon_fails,
            "mask {mask:03b}"
        );
        assert_eq!(
            outcome.error_for(Subsystem::Telemetry).is_some(),
            telemetry_fails,
            "mask {mask:03b}"
        );
        assert_eq!(
            outcome.error_for(Subsystem::Subscription).is_some(),
            subscription_fails,
            "mask {mask:03b}"
        );
        assert_eq!(outcome.is_success(), mask == 0, "mask {mask:03b}");
    }
}

#[tokio::test]
async fn status_reports_each_subsystem_independently() -> anyhow::Result<()> {
    let host = FakeHost::default()
        .subscription(|sub| sub.registered("existing-id"))
        .daemon(|daemon| daemon.with_state("active\n"));
    let snapshot = StatusAggregator::new(host.clients()).status().await?;

    assert!(snapshot.subscription_connected);
    assert!(matches!(snapshot.telemetry, TelemetryState::Disconnected));
    assert!(snapshot.daemon_active);
    assert_eq!(snapshot.daemon_state, "active");
    Ok(())
}

#[tokio::test]
async fn status_survives_missing_insights_client() -> anyhow::Result<()> {
    let host = FakeHost::default()
        .telemetry(FakeTelemetry::without_tool)
        .daemon(|daemon| daemon.with_state("failed"));
    let snapshot = StatusAggregator::new(host.clients()).status().await?;

    assert!(!snapshot.subscription_connected);
    match &snapshot.telemetry {
        TelemetryState::Unknown(err) => assert!(err.is_tool_missing()),
        other => panic!("expected unknown telemetry state, got {other:?}"),
    }
    assert!(!snapshot.daemon_active);
    assert_eq!(snapshot.daemon_state, "failed");
    Ok(())
}

#[tokio::test]
async fn status_fails_when_daemon_query_fails() {
    let host = FakeHost::default().daemon(|daemon: FakeDaemon| daemon.failing("active_state"));
    let err = StatusAggregator::new(host.clients())
        .status()
        .await
        .expect_err("daemon query failure is fatal");

    match err {
        ConnectorError::Subsystem(failure) => {
            assert_eq!(failure.subsystem, Subsystem::Daemon);
            assert_eq!(failure.to_string(), "cannot query the rhc daemon");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[derive(Default)]
struct RecordingStatus(Mutex<Vec<String>>);

impl RecordingStatus {
    fn push(&self, event: String) {
        if let Ok(mut events) = self.0.lock() {
            events.push(event);
        }
    }

    fn events(&self) -> Vec<String> {
        self.0.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl StatusObserver for RecordingStatus {
    fn query_started(&self, subsystem: Subsystem) {
        self.push(format!("start {}", subsystem.label()));
    }

    fn subscription_resolved(&self, connected: bool) {
        self.push(format!("rhsm {connected}"));
    }

    fn telemetry_resolved(&self, state: &TelemetryState) {
        self.push(format!("insights {}", state.is_connected()));
    }

    fn daemon_resolved(&self, active: bool, state: &str) {
        self.push(format!("rhcd {active} {state}"));
    }
}

#[tokio::test]
async fn status_delivers_resolved_states_before_a_daemon_failure() {
    let host = FakeHost::default()
        .subscription(|sub| sub.registered("existing-id"))
        .telemetry(FakeTelemetry::registered)
        .daemon(|daemon| daemon.failing("active_state"));
    let observer = RecordingStatus::default();
    let result = StatusAggregator::new(host.clients()).observe(&observer).await;

    assert!(result.is_err());
    assert_eq!(
        observer.events(),
        vec![
            "start rhsm",
            "rhsm true",
            "start insights",
            "insights true",
            "start rhcd",
        ]
    );
}

#[tokio::test]
async fn status_observer_sees_every_subsystem_on_success() -> anyhow::Result<()> {
    let host = FakeHost::default().daemon(|daemon| daemon.with_state("active"));
    let observer = RecordingStatus::default();
    let snapshot = StatusAggregator::new(host.clients()).observe(&observer).await?;

    assert!(snapshot.daemon_active);
    assert_eq!(
        observer.events(),
        vec![
            "start rhsm",
            "rhsm false",
            "start insights",
            "insights false",
            "start rhcd",
            "rhcd true active",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn prompted_credentials_drive_password_registration() -> anyhow::Result<()> {
    let mut prompter = ScriptedPrompter::default().line("alice\n").secret("s3cret");
    let credentials = CredentialResolver::new(&mut prompter).resolve(CredentialFlags::default())?;
    assert_eq!(prompter.prompts(), ["Username: ", "Password: "]);

    let host = FakeHost::default();
    let outcome = Orchestrator::new(host.clients())
        .connect(&credentials, &NoopObserver)
        .await;

    assert!(outcome.is_success());
    assert!(host.log.contains_prefix("rhsm.password:alice"));
    assert!(!host.log.contains_prefix("rhsm.activation_key"));
    Ok(())
}

#[tokio::test]
async fn organization_wins_over_username() -> anyhow::Result<()> {
    let mut prompter = ScriptedPrompter::default();
    let credentials = CredentialResolver::new(&mut prompter).resolve(CredentialFlags {
        organization: "12345".into(),
        activation_keys: vec!["web".into()],
        username: "alice".into(),
        password: "s3cret".into(),
        server: None,
    })?;

    assert!(matches!(credentials, Credentials::ActivationKey { .. }));
    assert!(prompter.prompts().is_empty());
    Ok(())
}
