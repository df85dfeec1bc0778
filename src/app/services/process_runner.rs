//! Bounded-time execution of external commands
//!
//! The login and extraction operations are opaque child processes. This
//! module runs them with a time budget, captures their output and kills the
//! child when the budget is exceeded. The [`CommandRunner`] trait is the seam
//! the pipeline depends on, so runs can be exercised without real scripts.

use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// One external command to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Invocation {
    /// Build an invocation from a configured command line (program first)
    pub fn from_command(command: &[String], timeout: Duration) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::configuration("External command cannot be empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            working_dir: None,
            timeout,
        })
    }

    /// Append arguments
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    /// Run the command from `dir`
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Program and arguments as a single display string
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the child was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Zero exit status
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short failure description for logs
    pub fn failure_summary(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr)
        }
    }
}

/// Executes external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion within the invocation's time budget
    ///
    /// Returns the captured output for any exit status; spawn failures and
    /// timeouts are errors.
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Runs commands as tokio child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        debug!("Running `{}`", invocation.command_line());

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        // Dropping the output future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(invocation.timeout, command.output()).await {
            Ok(result) => result.map_err(|e| Error::process(&invocation.program, e.to_string()))?,
            Err(_) => {
                return Err(Error::process_timeout(
                    &invocation.program,
                    invocation.timeout.as_secs(),
                ));
            }
        };

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
