//! Rally deployment records
//!
//! A deployment is a named configuration record inside Rally describing
//! the cloud under test. Rally assigns the UUID server-side; the harness
//! resolves it by matching the target's auth parameters against the
//! listing and caches the result (never invalidated).

use crate::cmd::{self, rally};
use crate::config::TargetCloud;
use crate::constants::DEPLOYMENT_CONFIG_FILE;
use crate::engine::BenchmarkEngine;
use crate::error::HarnessResult;

pub struct Deployment {
    target: TargetCloud,
    proxy_url: String,
    cached_uuid: Option<String>,
}

impl Deployment {
    pub fn new(target: TargetCloud, proxy_url: impl Into<String>) -> Self {
        Self {
            target,
            proxy_url: proxy_url.into(),
            cached_uuid: None,
        }
    }

    pub fn target(&self) -> &TargetCloud {
        &self.target
    }

    /// UUID of the matching deployment record, memoized after the first
    /// successful lookup.
    ///
    /// Scans the listing in order and takes the first record whose
    /// `auth_url`, `username` and `tenant_name` equal the target's.
    /// `Ok(None)` means no record matches yet; the cache stays unset so a
    /// later call re-checks.
    pub async fn uuid(&mut self, engine: &BenchmarkEngine) -> HarnessResult<Option<String>> {
        if self.cached_uuid.is_none() {
            let auth_url = self.target.auth_url();
            for d_uuid in engine.list_deployments().await? {
                let info = engine.show_deployment(&d_uuid).await?;
                tracing::debug!(deployment = %d_uuid, ?info, "Deployment info");
                if info.get("auth_url") == Some(&auth_url)
                    && info.get("username") == Some(&self.target.username)
                    && info.get("tenant_name") == Some(&self.target.tenant_name)
                {
                    self.cached_uuid = Some(d_uuid);
                    break;
                }
            }
        }
        Ok(self.cached_uuid.clone())
    }

    /// Whether a matching deployment record exists.
    pub async fn exists(&mut self, engine: &BenchmarkEngine) -> HarnessResult<bool> {
        Ok(self.uuid(engine).await?.is_some())
    }

    /// Whether the container's `http_proxy` matches the configured proxy.
    pub async fn is_proxy_set(&self, engine: &BenchmarkEngine) -> HarnessResult<bool> {
        let cmd = format!(r#"[ "${{http_proxy}}" == "{}" ]"#, self.proxy_url);
        Ok(engine.container().execute(&cmd).await?.success())
    }

    /// Register the deployment unless a match already exists (and `force`
    /// is unset): write the config document into the container, issue the
    /// create command named after the VIP, and verify via
    /// [`check`](Self::check).
    pub async fn create(&mut self, engine: &BenchmarkEngine, force: bool) -> HarnessResult<()> {
        if self.exists(engine).await? && !force {
            tracing::info!("Deployment already exists, skipping creation");
            return Ok(());
        }

        let document = serde_json::json!({
            "admin": {
                "username": self.target.username,
                "password": self.target.password,
                "tenant_name": self.target.tenant_name,
            },
            "auth_url": self.target.auth_url(),
            "endpoint": null,
            "type": "ExistingCloud",
            "https_insecure": true,
        });
        let cmd = cmd::write_file(DEPLOYMENT_CONFIG_FILE, &document.to_string());
        let result = engine.container().execute(&cmd).await?;
        tracing::debug!(exit_code = result.exit_code, "Wrote deployment config");

        let cmd = rally::deployment_create(&self.target.vip, DEPLOYMENT_CONFIG_FILE);
        let result = engine.container().execute(&cmd).await?;
        if !result.success() {
            tracing::warn!(
                exit_code = result.exit_code,
                stderr = %result.stderr_joined(),
                "rally deployment create exited non-zero"
            );
        }

        let uuid = self.uuid(engine).await?;
        tracing::info!(deployment = ?uuid, "Deployment created");
        self.check(engine, uuid.as_deref().unwrap_or_default()).await?;
        Ok(())
    }

    /// Run the deployment check; failure is logged, never fatal.
    pub async fn check(&self, engine: &BenchmarkEngine, uuid: &str) -> HarnessResult<bool> {
        let cmd = rally::deployment_check(uuid);
        let result = engine.container().execute(&cmd).await?;
        if result.success() {
            Ok(true)
        } else {
            tracing::error!(
                deployment = %uuid,
                exit_code = result.exit_code,
                stderr = %result.stderr_joined(),
                "Rally deployment check failed"
            );
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::EngineConfig;
    use crate::remote::CommandOutput;
    use crate::test_utils::shell::{out, ScriptedShell};

    const UUID_A: &str = "4e3c7e55-5bcd-46f7-a64d-47bdbd4d2aa2";
    const UUID_B: &str = "9f2400ac-85f3-4a28-9bf2-4b1e4eea818a";

    fn target() -> TargetCloud {
        TargetCloud::new("10.0.0.5", "admin", "secret", "admin")
    }

    async fn running_engine(shell: ScriptedShell) -> (Arc<ScriptedShell>, BenchmarkEngine) {
        let shell = Arc::new(
            shell
                .on("docker run", out(0, &[]))
                .on("docker ps -lq", out(0, &["abc123"])),
        );
        let mut engine = BenchmarkEngine::new(shell.clone(), EngineConfig::new("rallyforge/rally"));
        engine.init_container().await.unwrap();
        (shell, engine)
    }

    fn show_output(auth_url: &str, username: &str, tenant: &str) -> CommandOutput {
        CommandOutput {
            exit_code: 0,
            stdout: vec![
                "auth_url username tenant_name".to_string(),
                format!("{auth_url} {username} {tenant}"),
            ],
            stderr: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_uuid_returns_first_match_in_listing_order() {
        let (_, engine) = running_engine(
            ScriptedShell::new()
                .on("rally deployment list", out(0, &[UUID_A, UUID_B]))
                .on(
                    "rally deployment show",
                    show_output("http://10.0.0.5:5000/v2.0/", "admin", "admin"),
                ),
        )
        .await;
        let mut deployment = Deployment::new(target(), "");
        assert_eq!(deployment.uuid(&engine).await.unwrap().as_deref(), Some(UUID_A));
    }

    #[tokio::test]
    async fn test_uuid_none_when_nothing_matches() {
        let (_, engine) = running_engine(
            ScriptedShell::new()
                .on("rally deployment list", out(0, &[UUID_A, UUID_B]))
                .on(
                    "rally deployment show",
                    show_output("http://10.9.9.9:5000/v2.0/", "admin", "admin"),
                ),
        )
        .await;
        let mut deployment = Deployment::new(target(), "");
        assert_eq!(deployment.uuid(&engine).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_uuid_requires_exact_triple_match() {
        // Same auth_url, wrong tenant.
        let (_, engine) = running_engine(
            ScriptedShell::new()
                .on("rally deployment list", out(0, &[UUID_A]))
                .on(
                    "rally deployment show",
                    show_output("http://10.0.0.5:5000/v2.0/", "admin", "services"),
                ),
        )
        .await;
        let mut deployment = Deployment::new(target(), "");
        assert_eq!(deployment.uuid(&engine).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_skips_when_match_exists_without_force() {
        let (shell, engine) = running_engine(
            ScriptedShell::new()
                .on("rally deployment list", out(0, &[UUID_A]))
                .on(
                    "rally deployment show",
                    show_output("http://10.0.0.5:5000/v2.0/", "admin", "admin"),
                ),
        )
        .await;
        let mut deployment = Deployment::new(target(), "");
        deployment.create(&engine, false).await.unwrap();
        assert!(!shell
            .commands()
            .iter()
            .any(|cmd| cmd.contains("rally deployment create")));
    }

    #[tokio::test]
    async fn test_create_writes_config_and_checks() {
        let (shell, engine) = running_engine(
            ScriptedShell::new()
                .on_seq("rally deployment list |", vec![out(0, &[]), out(0, &[UUID_A])])
                .on(
                    "rally deployment show",
                    show_output("http://10.0.0.5:5000/v2.0/", "admin", "admin"),
                )
                .on("echo '{", out(0, &[]))
                .on("rally deployment create", out(0, &[]))
                .on("rally deployment check", out(0, &[])),
        )
        .await;
        let mut deployment = Deployment::new(target(), "");
        deployment.create(&engine, false).await.unwrap();

        let commands = shell.commands();
        let write = commands
            .iter()
            .find(|cmd| cmd.contains("> depl.conf"))
            .expect("deployment config written");
        assert!(write.contains("ExistingCloud"));
        assert!(write.contains("https_insecure"));
        assert!(commands
            .iter()
            .any(|cmd| cmd.contains("rally deployment create --name 10.0.0.5")));
        assert!(commands
            .iter()
            .any(|cmd| cmd.contains(&format!("rally deployment check {UUID_A}"))));
    }

    #[tokio::test]
    async fn test_check_failure_is_nonfatal() {
        let (_, engine) =
            running_engine(ScriptedShell::new().on("rally deployment check", out(1, &[]))).await;
        let deployment = Deployment::new(target(), "");
        assert!(!deployment.check(&engine, UUID_A).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_proxy_set_checks_container_env() {
        let (shell, engine) =
            running_engine(ScriptedShell::new().on("http_proxy", out(0, &[]))).await;
        let deployment = Deployment::new(target(), "http://proxy:3128");
        assert!(deployment.is_proxy_set(&engine).await.unwrap());
        assert!(shell
            .commands()
            .iter()
            .any(|cmd| cmd.contains("http://proxy:3128")));
    }
}
