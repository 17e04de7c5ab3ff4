use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use rhc_core::{ClientError, ClientResult};

use crate::command::{CommandOutput, CommandRunner};

/// Replays queued outputs and records each invocation as `program arg...`.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    replies: Mutex<VecDeque<ClientResult<CommandOutput>>>,
    invocations: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn reply(self, code: i32, stdout: &str, stderr: &str) -> Self {
        self.push(Ok(CommandOutput {
            code: Some(code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }))
    }

    pub(crate) fn missing(self, program: &str) -> Self {
        self.push(Err(ClientError::ToolNotFound {
            program: program.to_string(),
        }))
    }

    fn push(self, reply: ClientResult<CommandOutput>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        self
    }

    pub(crate) fn invocations(&self) -> Vec<String> {
        self.invocations
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> ClientResult<CommandOutput> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        if let Ok(mut calls) = self.invocations.lock() {
            calls.push(line);
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or_else(|| Ok(CommandOutput::default()))
    }
}
