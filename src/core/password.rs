use anyhow::{bail, Context, Result};
use console::Term;
use tracing::{debug, error, info, warn};

use crate::config::ValidationError;
use crate::utils::{CommandRunner, ExternalCommand};

/// Extra attempts allowed after the first mismatching pair of entries
const MAX_RETRIES: usize = 2;

/// Source of secret input such as the root password
pub trait SecretPrompt {
    fn read_secret(&self, prompt: &str) -> Result<String>;
}

/// Reads from the controlling terminal without echoing input
pub struct TerminalPrompt {
    term: Term,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self { term: Term::stderr() }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretPrompt for TerminalPrompt {
    fn read_secret(&self, prompt: &str) -> Result<String> {
        // console hands back an empty line instead of prompting without a tty
        if !self.term.is_term() {
            bail!("Cannot prompt for the root password: standard error is not a terminal");
        }
        self.term
            .write_str(prompt)
            .context("Failed to write password prompt")?;
        self.term
            .read_secure_line()
            .context("Failed to read password from terminal")
    }
}

/// Ask for the root password twice until both entries match.
///
/// An empty entry counts as a failed attempt.
pub fn prompt_root_password(prompt: &dyn SecretPrompt) -> Result<String> {
    let mut failure = None;

    for _ in 0..=MAX_RETRIES {
        if let Some(failure) = &failure {
            warn!("{}, re-enter correct password...", failure);
        }

        let first = prompt.read_secret("Enter the password for the ESXi root account : ")?;
        let second = prompt.read_secret("Re-enter the password for the ESXi root account : ")?;

        if first.is_empty() || second.is_empty() {
            failure = Some(ValidationError::EmptyPassword);
        } else if first != second {
            failure = Some(ValidationError::PasswordMismatch);
        } else {
            debug!("The password entered has been verified.");
            return Ok(first);
        }
    }

    let failure = failure.unwrap_or(ValidationError::PasswordMismatch);
    error!("{}. Exiting...", failure);
    Err(failure.into())
}

/// SHA-512 crypt hash of `password`, fed to openssl on stdin
pub fn encrypt_password(runner: &dyn CommandRunner, password: &str) -> Result<String> {
    info!("Generating an encrypted password for the ESXi root account using a SHA512-based password algorithm.");

    let command = ExternalCommand::new("openssl")
        .args(["passwd", "-6", "-stdin"])
        .stdin(format!("{}\n", password));
    let output = runner.run(&command, "Generate an encrypted password")?;

    Ok(output.trim().to_string())
}
