//! Remote Docker container management
//!
//! One [`RemoteContainer`] wraps one container instance on the remote
//! host. The runtime is only reachable as shell strings over the remote
//! channel; builders in [`crate::cmd::docker`] produce them.

use std::sync::Arc;

use crate::cmd::docker;
use crate::error::{HarnessError, HarnessResult};
use crate::remote::{CommandOutput, RemoteShell};

pub use crate::cmd::docker::RunOptions;

/// A single container on the remote host, identified by the id Docker
/// assigned at creation.
pub struct RemoteContainer {
    shell: Arc<dyn RemoteShell>,
    id: Option<String>,
}

impl RemoteContainer {
    pub fn new(shell: Arc<dyn RemoteShell>) -> Self {
        Self { shell, id: None }
    }

    /// Container id, once [`run`](Self::run) has succeeded.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Launch a detached interactive container from `image` and record its id.
    ///
    /// The id is queried from the runtime as the most-recently-created
    /// container, matching how the launch command itself stays silent in
    /// detached mode.
    pub async fn run(&mut self, image: &str, opts: &RunOptions) -> HarnessResult<()> {
        let cmd = docker::run(image, opts);
        let result = self.shell.execute(&cmd).await?;
        if !result.success() {
            return Err(HarnessError::ContainerCreate(result.stderr_joined()));
        }

        let cmd = docker::last_container_id();
        let result = self.shell.execute(&cmd).await?;
        if !result.success() {
            return Err(HarnessError::command_failed(cmd, &result));
        }
        tracing::debug!(stdout = ?result.stdout, "Queried last container id");
        let id = result
            .stdout
            .first()
            .map(|line| line.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| HarnessError::UnexpectedOutput {
                command: cmd,
                reason: "empty container id".to_string(),
            })?;
        tracing::debug!(container = %id, image = %image, "Container started");
        self.id = Some(id);
        Ok(())
    }

    /// Run `cmd` inside the container via `bash -c`.
    ///
    /// Returns the raw output; a non-zero exit code is not an error here —
    /// callers interpret it.
    pub async fn execute(&self, cmd: &str) -> HarnessResult<CommandOutput> {
        let id = self.require_id()?;
        Ok(self.shell.execute(&docker::exec(id, cmd)).await?)
    }

    /// Commit the container under `repotag`.
    pub async fn commit(&self, repotag: &str) -> HarnessResult<CommandOutput> {
        let id = self.require_id()?;
        Ok(self.shell.execute(&docker::commit(id, repotag)).await?)
    }

    pub async fn stop(&self) -> HarnessResult<CommandOutput> {
        let id = self.require_id()?;
        Ok(self.shell.execute(&docker::stop(id)).await?)
    }

    pub async fn remove(&self) -> HarnessResult<CommandOutput> {
        let id = self.require_id()?;
        Ok(self.shell.execute(&docker::remove(id)).await?)
    }

    fn require_id(&self) -> HarnessResult<&str> {
        self.id.as_deref().ok_or(HarnessError::ContainerNotRunning)
    }
}
