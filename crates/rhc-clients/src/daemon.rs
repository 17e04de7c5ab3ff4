//! Daemon client controlling the rhc systemd unit through `systemctl`.

use std::sync::Arc;

use async_trait::async_trait;
use rhc_core::{ClientError, ClientResult, DaemonClient};
use tracing::info;

use crate::command::{CommandRunner, args};

/// Default program name.
pub const PROGRAM: &str = "systemctl";
/// Unit started on connect and stopped on disconnect.
pub const DEFAULT_UNIT: &str = "rhcd.service";

/// [`DaemonClient`] for one systemd unit.
pub struct SystemdUnit {
    runner: Arc<dyn CommandRunner>,
    program: String,
    unit: String,
}

impl SystemdUnit {
    /// Control `unit` with `program` through `runner`.
    #[must_use]
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            unit: unit.into(),
        }
    }
}

#[async_trait]
impl DaemonClient for SystemdUnit {
    async fn activate(&self) -> ClientResult<()> {
        self.runner
            .run(&self.program, &args(["enable", "--now", self.unit.as_str()]))
            .await?
            .into_success(&self.program, "enable")?;
        info!(unit = %self.unit, "unit enabled and started");
        Ok(())
    }

    async fn deactivate(&self) -> ClientResult<()> {
        self.runner
            .run(&self.program, &args(["disable", "--now", self.unit.as_str()]))
            .await?
            .into_success(&self.program, "disable")?;
        info!(unit = %self.unit, "unit stopped and disabled");
        Ok(())
    }

    async fn active_state(&self) -> ClientResult<String> {
        let output = self
            .runner
            .run(
                &self.program,
                &args(["show", "--property=ActiveState", "--value", self.unit.as_str()]),
            )
            .await?
            .into_success(&self.program, "show")?;
        let state = output.stdout.trim();
        if state.is_empty() {
            return Err(ClientError::UnexpectedOutput {
                program: self.program.clone(),
                operation: "show",
                output: output.stdout,
            });
        }
        Ok(state.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedRunner;

    fn unit(runner: &Arc<ScriptedRunner>) -> SystemdUnit {
        SystemdUnit::new(runner.clone(), PROGRAM, DEFAULT_UNIT)
    }

    #[tokio::test]
    async fn lifecycle_commands_target_the_unit() -> ClientResult<()> {
        let runner = Arc::new(
            ScriptedRunner::default()
                .reply(0, "", "Created symlink ...\n")
                .reply(0, "", "Removed ...\n"),
        );
        let daemon = unit(&runner);
        daemon.activate().await?;
        daemon.deactivate().await?;
        assert_eq!(
            runner.invocations(),
            vec![
                "systemctl enable --now rhcd.service",
                "systemctl disable --now rhcd.service",
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn active_state_is_trimmed() -> ClientResult<()> {
        let runner = Arc::new(ScriptedRunner::default().reply(0, "inactive\n", ""));
        assert_eq!(unit(&runner).active_state().await?, "inactive");
        assert_eq!(
            runner.invocations(),
            vec!["systemctl show --property=ActiveState --value rhcd.service"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_enable_reports_exit() {
        let runner = Arc::new(
            ScriptedRunner::default().reply(1, "", "Failed to enable unit: Unit file rhcd.service does not exist."),
        );
        let err = unit(&runner).activate().await.expect_err("enable failed");
        assert_eq!(
            err.to_string(),
            "systemctl enable exited with status 1: Failed to enable unit: Unit file rhcd.service does not exist."
        );
    }
}
