//! Rally engine: image lifecycle and parsed CLI queries
//!
//! [`BenchmarkEngine`] owns the Rally image lifecycle on the remote host
//! (exists / pull / prepare) and the one live container everything else
//! runs in. Listing and status queries come back as text scraped from the
//! Rally CLI.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::cmd::{docker, rally};
use crate::config::EngineConfig;
use crate::constants::{BASE_TAG, GECKODRIVER_URL, PIP_PACKAGES, READY_TAG, UTIL_PACKAGES};
use crate::container::{RemoteContainer, RunOptions};
use crate::error::{HarnessError, HarnessResult};
use crate::remote::RemoteShell;
use crate::task::TaskStatus;

pub struct BenchmarkEngine {
    shell: Arc<dyn RemoteShell>,
    config: EngineConfig,
    tag: String,
    container: RemoteContainer,
}

impl BenchmarkEngine {
    pub fn new(shell: Arc<dyn RemoteShell>, config: EngineConfig) -> Self {
        let container = RemoteContainer::new(shell.clone());
        Self {
            shell,
            config,
            tag: BASE_TAG.to_string(),
            container,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tag the engine currently targets; `"latest"` until [`setup`](Self::setup)
    /// has produced the ready image, `"ready"` afterwards.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The live Rally container.
    pub fn container(&self) -> &RemoteContainer {
        &self.container
    }

    fn repotag(&self, tag: &str) -> String {
        format!("{}:{}", self.config.container_repo, tag)
    }

    /// Whether `(repo, tag)` appears in the local image listing.
    pub async fn image_exists(&self, tag: &str) -> HarnessResult<bool> {
        tracing::debug!(repo = %self.config.container_repo, tag = %tag, "Checking Docker images…");
        let result = self.shell.execute(&docker::images()).await?;
        let exists = result.stdout.iter().any(|line| {
            let mut fields = line.split_whitespace();
            fields.next() == Some(self.config.container_repo.as_str())
                && fields.next() == Some(tag)
        });
        Ok(exists)
    }

    /// Pull the base image from the registry, then re-check existence.
    pub async fn pull_image(&self) -> HarnessResult<bool> {
        tracing::debug!(repo = %self.config.container_repo, "Downloading Rally image from registry…");
        let result = self.shell.execute(&docker::pull(&self.config.container_repo)).await?;
        tracing::debug!(exit_code = result.exit_code, "docker pull finished");
        self.image_exists(BASE_TAG).await
    }

    /// Launch the Rally container from the engine's current tag with the
    /// home and plugin bind mounts, proxy env vars, and host networking.
    pub async fn init_container(&mut self) -> HarnessResult<()> {
        let opts = RunOptions {
            user: Some(self.config.user_id.to_string()),
            bindings: vec![
                (
                    self.config.dir_for_home.clone(),
                    self.config.home_bind_path.clone(),
                ),
                (self.config.plugins_dir.clone(), self.config.plugins_dir.clone()),
            ],
            env_vars: vec![
                ("http_proxy".to_string(), self.config.proxy_url.clone()),
                ("https_proxy".to_string(), self.config.proxy_url.clone()),
            ],
            network: Some("host".to_string()),
        };
        let image = self.repotag(&self.tag);
        self.container.run(&image, &opts).await
    }

    /// Install utility packages and the browser-automation driver into the
    /// running container. Any failing step is a hard error.
    pub async fn setup_utils(&self) -> HarnessResult<()> {
        tracing::debug!(packages = ?UTIL_PACKAGES, "Installing utils into the Rally container…");
        let cmd = format!(
            "unset http_proxy https_proxy; apt-get update; apt-get install -y {}",
            UTIL_PACKAGES.join(" ")
        );
        let result = self.container.execute(&cmd).await?;
        if !result.success() {
            return Err(HarnessError::command_failed(cmd, &result));
        }

        let cmd = format!("pip install {}", PIP_PACKAGES.join(" "));
        let result = self.container.execute(&cmd).await?;
        if !result.success() {
            return Err(HarnessError::command_failed(cmd, &result));
        }

        let tarball = GECKODRIVER_URL.rsplit('/').next().unwrap_or(GECKODRIVER_URL);
        let cmd = format!(
            "wget {GECKODRIVER_URL}; tar zxf {tarball}; sudo mv geckodriver /usr/local/bin/"
        );
        let result = self.container.execute(&cmd).await?;
        if !result.success() {
            return Err(HarnessError::command_failed(cmd, &result));
        }
        Ok(())
    }

    /// Create the plugin directory in the container and upload the local
    /// plugin tree over the channel.
    pub async fn upload_plugins(&self) -> HarnessResult<()> {
        let cmd = format!("mkdir -p {}", self.config.plugins_dir);
        self.container.execute(&cmd).await?;
        self.shell
            .upload(&self.config.plugins_source, &self.config.plugins_dir)
            .await?;
        Ok(())
    }

    /// Ensure the Rally database exists, recreating it when absent.
    pub async fn create_database(&self) -> HarnessResult<()> {
        let check = rally::db_check();
        if self.container.execute(&check).await?.success() {
            return Ok(());
        }
        tracing::debug!("Recreating database for Rally…");
        let cmd = rally::db_recreate();
        let result = self.container.execute(&cmd).await?;
        if !result.success() {
            return Err(HarnessError::command_failed(cmd, &result));
        }
        let result = self.container.execute(&check).await?;
        if !result.success() {
            return Err(HarnessError::command_failed(check, &result));
        }
        Ok(())
    }

    /// One-time provisioning: run the base image, set up the database,
    /// utilities and plugins, then commit the result under the ready tag.
    pub async fn prepare_image(&mut self) -> HarnessResult<bool> {
        self.init_container().await?;

        self.create_database().await?;
        self.setup_utils().await?;
        self.upload_plugins().await?;

        self.container.stop().await?;
        self.container.commit(&self.repotag(READY_TAG)).await?;
        self.container.remove().await?;

        self.image_exists(READY_TAG).await
    }

    /// Make the engine operational: base image present (pulling if not),
    /// ready image present (preparing if not), live container running from
    /// the ready tag.
    pub async fn setup(&mut self) -> HarnessResult<()> {
        if !self.image_exists(BASE_TAG).await? && !self.pull_image().await? {
            return Err(HarnessError::ImageMissing {
                repo: self.config.container_repo.clone(),
                tag: BASE_TAG.to_string(),
            });
        }
        if !self.image_exists(READY_TAG).await? && !self.prepare_image().await? {
            return Err(HarnessError::ImageMissing {
                repo: self.config.container_repo.clone(),
                tag: READY_TAG.to_string(),
            });
        }
        self.tag = READY_TAG.to_string();

        // Run again, this time from the ready image.
        self.init_container().await?;

        let result = self.container.execute("rally deployment list").await?;
        tracing::debug!(stdout = ?result.stdout, "Existing deployments");
        Ok(())
    }

    /// Idempotently register a `rally_docker` alias in the remote root's
    /// bashrc for interactive debugging on the host.
    pub async fn setup_shell_alias(&self) -> HarnessResult<()> {
        let alias_name = "rally_docker";
        let check = format!(". /root/.bashrc && alias {alias_name}");
        if self.shell.execute(&check).await?.success() {
            return Ok(());
        }
        tracing::debug!("Creating bash alias for Rally on the host…");
        let alias = format!(
            "alias {alias_name}='docker run --user {user_id} --net=\"host\" \
             -e \"http_proxy={proxy}\" -t -i -v {home}:{bind} {repotag} rally'",
            user_id = self.config.user_id,
            proxy = self.config.proxy_url,
            home = self.config.dir_for_home,
            bind = self.config.home_bind_path,
            repotag = self.repotag(&self.tag),
        );
        let cmd = format!(
            "echo \"{}\" >> /root/.bashrc",
            crate::cmd::escape_double_quoted(&alias)
        );
        let result = self.shell.execute(&cmd).await?;
        if !result.success() {
            return Err(HarnessError::command_failed(cmd, &result));
        }
        let result = self.shell.execute(&check).await?;
        if !result.success() {
            return Err(HarnessError::command_failed(check, &result));
        }
        Ok(())
    }

    /// UUIDs of all registered deployments, in listing order.
    ///
    /// The CLI emits a table; only tokens that parse as UUIDs survive.
    pub async fn list_deployments(&self) -> HarnessResult<Vec<String>> {
        let result = self.container.execute(&rally::deployment_list()).await?;
        Ok(result
            .stdout
            .iter()
            .map(|line| line.trim())
            .filter(|token| Uuid::parse_str(token).is_ok())
            .map(str::to_string)
            .collect())
    }

    /// Field map of one deployment, zipped from the two-line show output
    /// (header + values). Any other line count is a hard error.
    pub async fn show_deployment(&self, uuid: &str) -> HarnessResult<HashMap<String, String>> {
        let cmd = rally::deployment_show(uuid);
        let result = self.container.execute(&cmd).await?;
        if result.stdout.len() != 2 {
            return Err(HarnessError::UnexpectedOutput {
                command: cmd,
                reason: format!("expected 2 lines, got {}", result.stdout.len()),
            });
        }
        let header = &result.stdout[0];
        let values = &result.stdout[1];
        Ok(header
            .split_whitespace()
            .map(str::to_string)
            .zip(values.split_whitespace().map(str::to_string))
            .collect())
    }

    /// UUIDs of all tasks known to Rally.
    pub async fn list_tasks(&self) -> HarnessResult<Vec<String>> {
        let result = self.container.execute(&rally::task_list()).await?;
        tracing::debug!(stdout = ?result.stdout, "Rally task listing");
        Ok(result
            .stdout
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Live status of one task, scraped as the last whitespace-separated
    /// token of the status output.
    pub async fn get_task_status(&self, uuid: &str) -> HarnessResult<TaskStatus> {
        let cmd = rally::task_status(uuid);
        let result = self.container.execute(&cmd).await?;
        if !result.success() {
            return Err(HarnessError::command_failed(cmd, &result));
        }
        let token = result
            .stdout_joined()
            .split_whitespace()
            .last()
            .map(str::to_string)
            .ok_or_else(|| HarnessError::UnexpectedOutput {
                command: cmd,
                reason: "empty status output".to_string(),
            })?;
        let status = TaskStatus::from(token.as_str());
        tracing::debug!(task = %uuid, status = %status, "Rally task status");
        Ok(status)
    }
}
