//! Step execution.
//!
//! [`StepExecutor`] is the boundary between the pipeline and the cluster.
//! [`KubectlExecutor`] runs planned commands as child processes: no shell,
//! arguments split on whitespace, one deadline per step.
//!
//! Execution never fails from the caller's point of view. A command that
//! cannot be spawned or that overruns its deadline comes back with exit code
//! `-1` and the error text; non-zero exits are ordinary results.

use std::future::Future;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::DiagnoseConfig;
use crate::error::{DiagnoseError, DiagnoseResult};

/// Exit code reported when a process did not run to completion.
pub const EXIT_NOT_RUN: i32 = -1;

/// Raw output of one command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Captured standard output.
    pub output: String,
    /// Exit code, or [`EXIT_NOT_RUN`].
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Standard error, spawn failure or timeout text.
    pub error: Option<String>,
}

impl CommandOutput {
    /// A successful run with the given stdout.
    #[must_use]
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit_code: 0,
            duration_ms: 0,
            error: None,
        }
    }

    /// A failed run with the given exit code and error text.
    #[must_use]
    pub fn failure(exit_code: i32, error: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            exit_code,
            duration_ms: 0,
            error: Some(error.into()),
        }
    }

    /// Sets the duration.
    #[must_use]
    pub const fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Runs one command string.
pub trait StepExecutor: Send + Sync {
    /// Execute `command` and report what happened. Never retries.
    fn execute(&self, command: &str) -> impl Future<Output = CommandOutput> + Send;

    /// Execute a command that needs at least `deadline` to finish, such as a
    /// bounded packet capture.
    ///
    /// Executors without their own deadline ignore it.
    fn execute_with_deadline(
        &self,
        command: &str,
        deadline: Duration,
    ) -> impl Future<Output = CommandOutput> + Send {
        let _ = deadline;
        self.execute(command)
    }
}

/// Executes commands as local child processes.
#[derive(Debug, Clone)]
pub struct KubectlExecutor {
    timeout: Duration,
}

impl KubectlExecutor {
    /// Creates an executor with the given per-step deadline.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Creates an executor using the configured step deadline.
    #[must_use]
    pub const fn from_config(config: &DiagnoseConfig) -> Self {
        Self::new(config.step_timeout())
    }

    /// The per-step deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run(command: &str, timeout: Duration) -> DiagnoseResult<CommandOutput> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(DiagnoseError::EmptyCommand)?;

        let child = Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| DiagnoseError::Timeout {
                command: command.to_string(),
                timeout,
            })??;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Ok(CommandOutput {
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
            exit_code: output.status.code().unwrap_or(EXIT_NOT_RUN),
            duration_ms: 0,
            error: (!stderr.is_empty()).then_some(stderr),
        })
    }

    async fn execute_within(&self, command: &str, timeout: Duration) -> CommandOutput {
        let start = Instant::now();
        debug!(command, timeout_secs = timeout.as_secs(), "executing step");

        let result = match Self::run(command, timeout).await {
            Ok(output) => output,
            Err(e) => {
                if e.is_timeout() {
                    warn!(command, timeout_secs = timeout.as_secs(), "step exceeded its deadline");
                } else {
                    warn!(command, error = %e, "step did not complete");
                }
                CommandOutput::failure(EXIT_NOT_RUN, e.to_string())
            }
        };

        let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        result.with_duration_ms(elapsed)
    }
}

impl Default for KubectlExecutor {
    fn default() -> Self {
        Self::from_config(&DiagnoseConfig::default())
    }
}

impl StepExecutor for KubectlExecutor {
    async fn execute(&self, command: &str) -> CommandOutput {
        self.execute_within(command, self.timeout).await
    }

    /// The step deadline is raised to `deadline`, never lowered.
    async fn execute_with_deadline(&self, command: &str, deadline: Duration) -> CommandOutput {
        self.execute_within(command, self.timeout.max(deadline)).await
    }
}

/// Scripted executor for tests.
///
/// Replies are matched by substring in insertion order; unmatched commands
/// fail with exit code 1.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FakeExecutor {
    replies: Vec<(String, CommandOutput)>,
    executed: std::sync::Mutex<Vec<String>>,
    deadlines: std::sync::Mutex<Vec<(String, Duration)>>,
}

#[cfg(test)]
impl FakeExecutor {
    /// Creates an executor with no replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies with `output` to any command containing `pattern`.
    #[must_use]
    pub fn reply(mut self, pattern: &str, output: CommandOutput) -> Self {
        self.replies.push((pattern.to_string(), output));
        self
    }

    /// Commands executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().expect("lock").clone()
    }

    /// Commands that asked for a longer deadline, with that deadline.
    pub fn deadlines(&self) -> Vec<(String, Duration)> {
        self.deadlines.lock().expect("lock").clone()
    }
}

#[cfg(test)]
impl StepExecutor for FakeExecutor {
    async fn execute(&self, command: &str) -> CommandOutput {
        self.executed.lock().expect("lock").push(command.to_string());
        self.replies
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map_or_else(
                || CommandOutput::failure(1, format!("no scripted reply for: {command}")),
                |(_, output)| output.clone(),
            )
    }

    async fn execute_with_deadline(&self, command: &str, deadline: Duration) -> CommandOutput {
        self.deadlines
            .lock()
            .expect("lock")
            .push((command.to_string(), deadline));
        self.execute(command).await
    }
}
