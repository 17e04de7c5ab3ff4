//! Credential resolution from flags with interactive fallback.

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::error::{ConnectorError, ConnectorResult};
use crate::model::Credentials;

/// Credential values as supplied on the command line; empty means absent.
#[derive(Clone, Debug, Default)]
pub struct CredentialFlags {
    /// Organization identifier (`--organization`).
    pub organization: String,
    /// Activation keys (`--activation-key`, repeatable).
    pub activation_keys: Vec<String>,
    /// Account username (`--username`).
    pub username: String,
    /// Account password (`--password`).
    pub password: String,
    /// Registration server override (`--server`).
    pub server: Option<String>,
}

/// Source of interactive answers for missing credentials.
pub trait Prompter {
    /// Show `prompt` and read a visible line of input.
    ///
    /// # Errors
    ///
    /// Returns an error when input cannot be read or the stream is closed.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Show `prompt` and read input without echoing it.
    ///
    /// # Errors
    ///
    /// Returns an error when input cannot be read or the stream is closed.
    fn read_secret(&mut self, prompt: &str) -> io::Result<String>;
}

/// Prompts on stdout and reads from stdin; secrets are read with echo disabled.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        drop(stdout);

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "standard input closed",
            ));
        }
        Ok(line)
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        let secret = rpassword::read_password()?;
        stdout.write_all(b"\n\n")?;
        stdout.flush()?;
        Ok(secret)
    }
}

/// Turns [`CredentialFlags`] into exactly one [`Credentials`] shape.
pub struct CredentialResolver<P> {
    prompter: P,
}

impl<P: Prompter> CredentialResolver<P> {
    /// Build a resolver that asks `prompter` for anything missing.
    pub const fn new(prompter: P) -> Self {
        Self { prompter }
    }

    /// Resolve the credentials for a connect attempt.
    ///
    /// A non-empty organization always selects activation keys and never
    /// prompts. Otherwise a missing username is prompted for, which also
    /// forces a fresh password prompt, and a missing password is read masked.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Credential`] when a prompt cannot be answered.
    pub fn resolve(&mut self, flags: CredentialFlags) -> ConnectorResult<Credentials> {
        let CredentialFlags {
            organization,
            activation_keys,
            mut username,
            mut password,
            server,
        } = flags;

        if !organization.is_empty() {
            debug!(
                keys = activation_keys.len(),
                "using organization and activation keys"
            );
            return Ok(Credentials::ActivationKey {
                organization,
                activation_keys,
                server,
            });
        }

        if username.is_empty() {
            password.clear();
            username = self
                .prompter
                .read_line("Username: ")
                .map_err(|err| ConnectorError::credential("username", err))?
                .trim()
                .to_string();
        }

        if password.is_empty() {
            password = self
                .prompter
                .read_secret("Password: ")
                .map_err(|err| ConnectorError::credential("password", err))?;
            trim_line_ending(&mut password);
        }

        Ok(Credentials::Password {
            username,
            password,
            server,
        })
    }
}

fn trim_line_ending(value: &mut String) {
    while value.ends_with('\n') || value.ends_with('\r') {
        value.pop();
    }
}
