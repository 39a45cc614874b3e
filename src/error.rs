//! Custom error types and handling
//!
//! Any unexpected exit code or output shape from a remote command is a hard
//! error: the harness makes no attempt at structured recovery. Transport
//! failures of the remote channel itself are kept distinct from commands
//! that ran and failed.

use crate::remote::CommandOutput;

/// Harness-wide error type
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    // Remote command failures
    #[error("Command failed: {command} (exit code {exit_code}): {detail}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        detail: String,
    },

    #[error("Unexpected output from {command}: {reason}")]
    UnexpectedOutput { command: String, reason: String },

    // Image lifecycle
    #[error("Docker image {repo}:{tag} not found")]
    ImageMissing { repo: String, tag: String },

    // Container lifecycle
    #[error("Container creation failed: {0}")]
    ContainerCreate(String),

    #[error("Container has not been started")]
    ContainerNotRunning,

    // Task lifecycle
    #[error("Task has not been started")]
    TaskNotStarted,

    #[error("Task {uuid} is missing from the task listing")]
    TaskNotRegistered { uuid: String },

    #[error("Task {uuid} was not aborted (status: {status})")]
    AbortFailed { uuid: String, status: String },

    #[error("Task {uuid} ended with status {status}")]
    TaskEnded { uuid: String, status: String },

    // Results payload
    #[error("Unsupported results payload: expected exactly 1 record, got {0}")]
    ResultShape(usize),

    #[error("Invalid results payload: {0}")]
    ResultFormat(#[from] serde_json::Error),

    // Bounded waits
    #[error("Timed out after {seconds}s waiting for {what}")]
    Timeout { seconds: u64, what: String },

    // Remote channel errors (SSH and friends)
    #[error("Remote channel error: {0}")]
    Transport(#[from] anyhow::Error),
}

impl HarnessError {
    /// Build a [`CommandFailed`](Self::CommandFailed) from a command and its output.
    pub fn command_failed(command: impl Into<String>, output: &CommandOutput) -> Self {
        let detail = if output.stderr.is_empty() {
            output.stdout_joined()
        } else {
            output.stderr_joined()
        };
        Self::CommandFailed {
            command: command.into(),
            exit_code: output.exit_code,
            detail,
        }
    }
}

/// Result type alias using HarnessError
pub type HarnessResult<T> = Result<T, HarnessError>;
