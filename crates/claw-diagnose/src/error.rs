//! Error types for claw-diagnose.
//!
//! The diagnostic pipeline itself never fails: step failures are recorded in
//! [`StepResult`](crate::types::StepResult)s. These errors cover the surfaces
//! around it (configuration, process spawning, rendering).

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the fallible parts of the crate.
#[derive(Debug, Error)]
pub enum DiagnoseError {
    /// Configuration could not be read, parsed or validated.
    #[error("configuration error: {0}")]
    Config(String),

    /// A command string contained no program to run.
    #[error("empty command")]
    EmptyCommand,

    /// A step did not finish within its deadline.
    #[error("command timed out after {}s: {command}", .timeout.as_secs())]
    Timeout {
        /// The command that timed out.
        command: String,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// IO error (spawning or reading a process, reading a file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DiagnoseError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true if this error is a step timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result alias for claw-diagnose operations.
pub type DiagnoseResult<T> = Result<T, DiagnoseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = DiagnoseError::config("log_tail_lines must be greater than zero");
        assert_eq!(
            err.to_string(),
            "configuration error: log_tail_lines must be greater than zero"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = DiagnoseError::Timeout {
            command: "kubectl get pods".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "command timed out after 30s: kubectl get pods");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "kubectl: not found");
        let err: DiagnoseError = io.into();
        assert!(matches!(err, DiagnoseError::Io(_)));
        assert!(!err.is_timeout());
    }
}
