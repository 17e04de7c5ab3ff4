//! Subscription client driving `subscription-manager`.

use std::sync::Arc;

use async_trait::async_trait;
use rhc_core::{ClientError, ClientResult, SubscriptionClient};
use tracing::{debug, info};

use crate::command::{CommandOutput, CommandRunner, args};

/// Default program name.
pub const PROGRAM: &str = "subscription-manager";

const IDENTITY_PREFIX: &str = "system identity:";
const UNREGISTERED_MARKERS: [&str; 2] = ["not yet registered", "not registered"];

/// [`SubscriptionClient`] over the `subscription-manager` CLI.
pub struct SubscriptionManager {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl SubscriptionManager {
    /// Drive `program` through `runner`.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    async fn run(&self, args: &[String]) -> ClientResult<CommandOutput> {
        self.runner.run(&self.program, args).await
    }

    async fn register(
        &self,
        mut register_args: Vec<String>,
        server: Option<&str>,
    ) -> ClientResult<()> {
        if let Some(server) = server.filter(|url| !url.is_empty()) {
            register_args.push("--serverurl".to_string());
            register_args.push(server.to_string());
        }
        self.run(&register_args)
            .await?
            .into_success(&self.program, "register")?;
        info!(program = %self.program, "host registered");
        Ok(())
    }
}

#[async_trait]
impl SubscriptionClient for SubscriptionManager {
    async fn registration_id(&self) -> ClientResult<String> {
        let output = self.run(&args(["identity"])).await?;
        if !output.success() {
            let combined = format!("{}\n{}", output.stdout, output.stderr).to_lowercase();
            if UNREGISTERED_MARKERS
                .iter()
                .any(|marker| combined.contains(marker))
            {
                debug!(program = %self.program, "host is not registered");
                return Ok(String::new());
            }
            return Err(output.failure(&self.program, "identity"));
        }

        parse_identity(&output.stdout).ok_or_else(|| ClientError::UnexpectedOutput {
            program: self.program.clone(),
            operation: "identity",
            output: output.stdout.trim().to_string(),
        })
    }

    async fn register_with_activation_key(
        &self,
        organization: &str,
        activation_keys: &[String],
        server: Option<&str>,
    ) -> ClientResult<()> {
        let mut register_args = args(["register", "--org", organization]);
        if !activation_keys.is_empty() {
            register_args.push("--activationkey".to_string());
            register_args.push(activation_keys.join(","));
        }
        self.register(register_args, server).await
    }

    async fn register_with_password(
        &self,
        username: &str,
        password: &str,
        server: Option<&str>,
    ) -> ClientResult<()> {
        let register_args = args(["register", "--username", username, "--password", password]);
        self.register(register_args, server).await
    }

    async fn unregister(&self) -> ClientResult<()> {
        self.run(&args(["unregister"]))
            .await?
            .into_success(&self.program, "unregister")?;
        info!(program = %self.program, "host unregistered");
        Ok(())
    }
}

fn parse_identity(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let line = line.trim();
        let prefix = line.get(..IDENTITY_PREFIX.len())?;
        prefix
            .eq_ignore_ascii_case(IDENTITY_PREFIX)
            .then(|| line[IDENTITY_PREFIX.len()..].trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedRunner;

    const IDENTITY: &str = "system identity: 5b8e3c0a-7a0f-4a41-9b1e-2f8c6d3e9a11\n\
                            name: web01.example.com\n\
                            org name: 12345\n\
                            org ID: 12345\n";

    fn client(runner: &Arc<ScriptedRunner>) -> SubscriptionManager {
        SubscriptionManager::new(runner.clone(), PROGRAM)
    }

    #[tokio::test]
    async fn identity_output_yields_registration_id() -> ClientResult<()> {
        let runner = Arc::new(ScriptedRunner::default().reply(0, IDENTITY, ""));
        let id = client(&runner).registration_id().await?;
        assert_eq!(id, "5b8e3c0a-7a0f-4a41-9b1e-2f8c6d3e9a11");
        assert_eq!(runner.invocations(), vec!["subscription-manager identity"]);
        Ok(())
    }

    #[tokio::test]
    async fn unregistered_host_yields_empty_id() -> ClientResult<()> {
        let runner = Arc::new(ScriptedRunner::default().reply(
            1,
            "",
            "This system is not yet registered. Try 'subscription-manager register --help' for more information.\n",
        ));
        assert_eq!(client(&runner).registration_id().await?, "");
        Ok(())
    }

    #[tokio::test]
    async fn other_identity_failures_are_errors() {
        let runner = Arc::new(ScriptedRunner::default().reply(70, "", "Unable to verify server's identity"));
        let err = client(&runner)
            .registration_id()
            .await
            .expect_err("identity failed");
        assert!(matches!(
            err,
            ClientError::CommandFailed {
                code: Some(70),
                operation: "identity",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn identity_without_id_line_is_unexpected() {
        let runner = Arc::new(ScriptedRunner::default().reply(0, "name: web01\n", ""));
        let err = client(&runner)
            .registration_id()
            .await
            .expect_err("no identity line");
        assert!(matches!(err, ClientError::UnexpectedOutput { .. }));
    }

    #[tokio::test]
    async fn activation_key_registration_joins_keys() -> ClientResult<()> {
        let runner = Arc::new(ScriptedRunner::default().reply(0, "", ""));
        client(&runner)
            .register_with_activation_key(
                "12345",
                &["web".to_string(), "db".to_string()],
                Some("https://subscription.example"),
            )
            .await?;
        assert_eq!(
            runner.invocations(),
            vec![
                "subscription-manager register --org 12345 --activationkey web,db --serverurl https://subscription.example"
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn password_registration_passes_account() -> ClientResult<()> {
        let runner = Arc::new(ScriptedRunner::default().reply(0, "", ""));
        client(&runner)
            .register_with_password("alice", "s3cret", None)
            .await?;
        assert_eq!(
            runner.invocations(),
            vec!["subscription-manager register --username alice --password s3cret"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_unregister_reports_stderr() {
        let runner = Arc::new(ScriptedRunner::default().reply(1, "", "This system is currently not registered.\n"));
        let err = client(&runner)
            .unregister()
            .await
            .expect_err("unregister failed");
        assert_eq!(
            err.to_string(),
            "subscription-manager unregister exited with status 1: This system is currently not registered."
        );
    }
}
