//! External command execution.

use crate::error::PacknetError;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default limit for any single external command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status was zero
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external programs
///
/// Implementations return `Ok` for any command that ran to completion,
/// whatever its exit status; only spawn failures and timeouts are errors.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput, PacknetError>;

    /// Run a command and fail unless it exits successfully
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, PacknetError> {
        let output = self.output(program, args).await?;
        if !output.success {
            return Err(PacknetError::ExternalCommandFailed {
                command: command_line(program, args),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

/// `program arg1 arg2 ...`, for error messages and logs
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build an owned argument vector from string slices
pub fn args<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Runs commands on the host through `tokio::process`
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    /// Runner that kills commands still running after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

#[async_trait::async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput, PacknetError> {
        let line = command_line(program, args);
        debug!(command = %line, "Running command");

        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(PacknetError::ExternalCommandFailed {
                    command: line,
                    message: format!("failed to execute: {}", e),
                });
            }
            Err(_) => {
                return Err(PacknetError::ExternalCommandFailed {
                    command: line,
                    message: format!("timed out after {:?}", self.timeout),
                });
            }
        };

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
