use std::ffi::OsStr;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{description} command did not run successfully ({status})")]
    Failed {
        description: String,
        status: String,
        stderr: String,
    },
}

/// An external program invocation with a structured argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Text written to the child's standard input, never logged
    pub stdin: Option<String>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if self.stdin.is_some() {
            write!(f, " <stdin>")?;
        }
        Ok(())
    }
}

/// Runs external programs to completion. Implementations log every
/// invocation and turn a non-zero exit into [`CommandError::Failed`].
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    fn run(&self, command: &ExternalCommand, description: &str) -> Result<String, CommandError>;
}

/// Runs commands on the host, blocking until they exit
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, command: &ExternalCommand, description: &str) -> Result<String, CommandError> {
        debug!("Running: {}", command);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if command.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let spawn_error = |source| {
            error!("{} command could not be started: {}", description, source);
            CommandError::Spawn {
                program: command.program.clone(),
                source,
            }
        };

        let mut child = cmd.spawn().map_err(spawn_error)?;

        if let (Some(input), Some(mut stdin)) = (&command.stdin, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).map_err(spawn_error)?;
        }

        let output = child.wait_with_output().map_err(spawn_error)?;
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            error!("{}", stderr.trim_end());
            error!("{} command did not run successfully. Exiting...", description);
            return Err(CommandError::Failed {
                description: description.to_string(),
                status: output.status.to_string(),
                stderr,
            });
        }

        info!("{} command ran successfully.", description);
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display_hides_stdin() {
        let cmd = ExternalCommand::new("openssl")
            .args(["passwd", "-6", "-stdin"])
            .stdin("secret");

        assert_eq!(cmd.to_string(), "openssl passwd -6 -stdin <stdin>");
        assert!(!cmd.to_string().contains("secret"));
    }

    #[test]
    fn test_path_arg() {
        let cmd = ExternalCommand::new("umount").path_arg(Path::new("/mnt/esxi_cdrom"));
        assert_eq!(cmd.args, vec!["/mnt/esxi_cdrom".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_stdout() {
        let runner = SystemCommandRunner::new();
        let cmd = ExternalCommand::new("sh").args(["-c", "echo hello"]);

        let stdout = runner.run(&cmd, "Echo").unwrap();
        assert_eq!(stdout, "hello\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_feeds_stdin() {
        let runner = SystemCommandRunner::new();
        let cmd = ExternalCommand::new("cat").stdin("piped text");

        assert_eq!(runner.run(&cmd, "Cat").unwrap(), "piped text");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_failure_with_stderr() {
        let runner = SystemCommandRunner::new();
        let cmd = ExternalCommand::new("sh").args(["-c", "echo broken >&2; exit 3"]);

        match runner.run(&cmd, "Broken") {
            Err(CommandError::Failed {
                description,
                stderr,
                ..
            }) => {
                assert_eq!(description, "Broken");
                assert_eq!(stderr, "broken\n");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_run_missing_program() {
        let runner = SystemCommandRunner::new();
        let cmd = ExternalCommand::new("ksiso-no-such-program");

        assert!(matches!(
            runner.run(&cmd, "Missing"),
            Err(CommandError::Spawn { .. })
        ));
    }
}
