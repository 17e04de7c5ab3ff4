//! Process execution seam shared by the tool-backed clients.
//!
//! # Design
//! - Clients never spawn processes directly; they go through a
//!   [`CommandRunner`] so tests can script tool output.
//! - Arguments are never logged: registration arguments carry passwords.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use rhc_core::{ClientError, ClientResult};
use tokio::process::Command;
use tracing::debug;

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the tool exited with status 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Convert a non-zero exit into [`ClientError::CommandFailed`].
    ///
    /// # Errors
    ///
    /// Returns the failure when the tool did not exit with status 0.
    pub fn into_success(self, program: &str, operation: &'static str) -> ClientResult<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(self.failure(program, operation))
    }

    /// Describe this output as a failed `operation`.
    #[must_use]
    pub fn failure(&self, program: &str, operation: &'static str) -> ClientError {
        let detail = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        ClientError::CommandFailed {
            program: program.to_string(),
            operation,
            code: self.code,
            stderr: detail.trim().to_string(),
        }
    }
}

/// Runs host tools and captures their output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion.
    ///
    /// A non-zero exit is not an error at this level; callers interpret
    /// exit codes themselves.
    async fn run(&self, program: &str, args: &[String]) -> ClientResult<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> ClientResult<CommandOutput> {
        debug!(program, subcommand = args.first().map(String::as_str), "spawning tool");
        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C.UTF-8")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| spawn_error(program, source))?;

        let output = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(program, code = ?output.code, "tool exited");
        Ok(output)
    }
}

fn spawn_error(program: &str, source: io::Error) -> ClientError {
    if source.kind() == io::ErrorKind::NotFound {
        ClientError::ToolNotFound {
            program: program.to_string(),
        }
    } else {
        ClientError::Io {
            program: program.to_string(),
            source,
        }
    }
}

/// Owned argument list from string slices.
pub(crate) fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(ToString::to_string).collect()
}
