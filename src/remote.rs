//! Remote-execution contract
//!
//! The channel that actually reaches the remote host (SSH in production)
//! is out of scope for the harness; everything here talks to it through
//! the [`RemoteShell`] trait. Commands are plain shell strings and their
//! results come back as captured output plus an exit code — callers decide
//! what a non-zero exit means.

use std::path::Path;

use async_trait::async_trait;

/// Captured result of one remote command.
///
/// Stdout and stderr are line-oriented, stored without trailing newlines.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_joined(&self) -> String {
        self.stdout.join("\n")
    }

    pub fn stderr_joined(&self) -> String {
        self.stderr.join("\n")
    }
}

/// Opaque remote-execution capability.
///
/// Implementations run a shell command on the remote host and upload a
/// local directory to a remote path. Executing a command that exits
/// non-zero is not a transport error; only a broken channel is.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `cmd` on the remote host and capture its output.
    async fn execute(&self, cmd: &str) -> anyhow::Result<CommandOutput>;

    /// Upload a local file or directory to `remote` on the remote host.
    async fn upload(&self, local: &Path, remote: &str) -> anyhow::Result<()>;
}
