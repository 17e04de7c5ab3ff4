//! Prompter that replays canned answers.

use std::collections::VecDeque;
use std::io;

use rhc_core::Prompter;

/// Answers prompts from queued lines and secrets, recording every prompt shown.
///
/// An exhausted queue behaves like a closed stdin.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    lines: VecDeque<String>,
    secrets: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedPrompter {
    /// Queue a visible answer.
    #[must_use]
    pub fn line(mut self, answer: &str) -> Self {
        self.lines.push_back(answer.to_string());
        self
    }

    /// Queue a masked answer.
    #[must_use]
    pub fn secret(mut self, answer: &str) -> Self {
        self.secrets.push_back(answer.to_string());
        self
    }

    /// Prompts shown so far, in order.
    #[must_use]
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left")
}

impl Prompter for ScriptedPrompter {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        self.lines.pop_front().ok_or_else(closed)
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        self.secrets.pop_front().ok_or_else(closed)
    }
}

impl Prompter for &mut ScriptedPrompter {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        (**self).read_line(prompt)
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        (**self).read_secret(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_answers_then_reports_closed_input() {
        let mut prompter = ScriptedPrompter::default().line("alice\n");
        assert_eq!(prompter.read_line("Username: ").ok().as_deref(), Some("alice\n"));
        let err = prompter
            .read_secret("Password: ")
            .expect_err("no secret queued");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(prompter.prompts(), ["Username: ", "Password: "]);
    }
}
