//! Telemetry client driving `insights-client`.

use std::sync::Arc;

use async_trait::async_trait;
use rhc_core::{ClientResult, TelemetryClient};
use tracing::info;

use crate::command::{CommandRunner, args};

/// Default program name.
pub const PROGRAM: &str = "insights-client";

/// [`TelemetryClient`] over the `insights-client` CLI.
pub struct InsightsClient {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl InsightsClient {
    /// Drive `program` through `runner`.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }
}

#[async_trait]
impl TelemetryClient for InsightsClient {
    async fn is_registered(&self) -> ClientResult<bool> {
        let output = self.runner.run(&self.program, &args(["--status"])).await?;
        match output.code {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(output.failure(&self.program, "status")),
        }
    }

    async fn register(&self) -> ClientResult<()> {
        self.runner
            .run(&self.program, &args(["--register"]))
            .await?
            .into_success(&self.program, "register")?;
        info!(program = %self.program, "insights registration complete");
        Ok(())
    }

    async fn unregister(&self) -> ClientResult<()> {
        self.runner
            .run(&self.program, &args(["--unregister"]))
            .await?
            .into_success(&self.program, "unregister")?;
        info!(program = %self.program, "insights registration removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedRunner;
    use rhc_core::ClientError;

    fn client(runner: &Arc<ScriptedRunner>) -> InsightsClient {
        InsightsClient::new(runner.clone(), PROGRAM)
    }

    #[tokio::test]
    async fn status_exit_codes_map_to_registration() -> ClientResult<()> {
        let runner = Arc::new(
            ScriptedRunner::default()
                .reply(0, "This host is registered.\n", "")
                .reply(1, "This host is unregistered.\n", ""),
        );
        let insights = client(&runner);
        assert!(insights.is_registered().await?);
        assert!(!insights.is_registered().await?);
        assert_eq!(
            runner.invocations(),
            vec!["insights-client --status", "insights-client --status"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn other_status_codes_are_errors() {
        let runner = Arc::new(ScriptedRunner::default().reply(2, "", "Could not reach the API"));
        let err = client(&runner)
            .is_registered()
            .await
            .expect_err("status check failed");
        assert!(matches!(err, ClientError::CommandFailed { code: Some(2), .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_tool_not_found() {
        let runner = Arc::new(ScriptedRunner::default().missing(PROGRAM));
        let err = client(&runner)
            .is_registered()
            .await
            .expect_err("binary missing");
        assert!(err.is_tool_missing());
    }

    #[tokio::test]
    async fn register_and_unregister_use_flags() -> ClientResult<()> {
        let runner = Arc::new(ScriptedRunner::default().reply(0, "", "").reply(0, "", ""));
        let insights = client(&runner);
        insights.register().await?;
        insights.unregister().await?;
        assert_eq!(
            runner.invocations(),
            vec!["insights-client --register", "insights-client --unregister"]
        );
        Ok(())
    }
}
