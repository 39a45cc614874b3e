//! Harness configuration
//!
//! Ambient state from the original test environment (proxy URL, home
//! directories, cluster credentials) is threaded through these explicit
//! config structs instead of globals. Everything can be loaded from
//! environment variables with sensible defaults for local runs.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_CONTAINER_REPO, DEFAULT_HOME_DIR, DEFAULT_KEYSTONE_PORT, HOME_BIND_PATH, PLUGINS_DIR,
};

/// Engine configuration: image coordinates, proxy, and bind-mount paths
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Docker repository holding the Rally image
    pub container_repo: String,

    /// Proxy URL exported into the container (empty string disables it)
    pub proxy_url: String,

    /// Numeric user the container runs as
    pub user_id: u32,

    /// Host directory bind-mounted as the Rally home
    pub dir_for_home: String,

    /// Mount point of the Rally home inside the container
    pub home_bind_path: String,

    /// Plugin directory inside the container
    pub plugins_dir: String,

    /// Local directory of Rally plugins uploaded into the container
    pub plugins_source: PathBuf,
}

impl EngineConfig {
    /// Configuration for `container_repo` with all other fields defaulted.
    pub fn new(container_repo: impl Into<String>) -> Self {
        Self {
            container_repo: container_repo.into(),
            proxy_url: String::new(),
            user_id: 0,
            dir_for_home: DEFAULT_HOME_DIR.to_string(),
            home_bind_path: HOME_BIND_PATH.to_string(),
            plugins_dir: PLUGINS_DIR.to_string(),
            plugins_source: default_plugins_source(),
        }
    }

    /// Load configuration from `RALLY_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            container_repo: env::var("RALLY_CONTAINER_REPO")
                .unwrap_or_else(|_| DEFAULT_CONTAINER_REPO.to_string()),
            proxy_url: env::var("RALLY_PROXY_URL").unwrap_or_default(),
            user_id: env::var("RALLY_USER_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            dir_for_home: env::var("RALLY_HOME_DIR")
                .unwrap_or_else(|_| DEFAULT_HOME_DIR.to_string()),
            home_bind_path: HOME_BIND_PATH.to_string(),
            plugins_dir: PLUGINS_DIR.to_string(),
            plugins_source: env::var("RALLY_PLUGINS_SOURCE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_plugins_source()),
        }
    }
}

/// Plugins live under the CI workspace when running from Jenkins,
/// under the current directory otherwise.
fn default_plugins_source() -> PathBuf {
    let workspace = env::var("WORKSPACE").unwrap_or_else(|_| "./".to_string());
    PathBuf::from(workspace).join("rally/plugins")
}

/// Already-resolved coordinates of the cloud under test.
///
/// Cluster discovery (VIP, credentials, proxy lookup) happens elsewhere in
/// the test suite; the harness receives the final values.
#[derive(Debug, Clone)]
pub struct TargetCloud {
    /// Management VIP of the cluster
    pub vip: String,

    /// Admin username
    pub username: String,

    /// Admin password
    pub password: String,

    /// Admin tenant name
    pub tenant_name: String,

    /// Keystone port
    pub keystone_port: u16,
}

impl TargetCloud {
    pub fn new(
        vip: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        tenant_name: impl Into<String>,
    ) -> Self {
        Self {
            vip: vip.into(),
            username: username.into(),
            password: password.into(),
            tenant_name: tenant_name.into(),
            keystone_port: DEFAULT_KEYSTONE_PORT,
        }
    }

    /// Keystone v2.0 auth URL for this cloud.
    pub fn auth_url(&self) -> String {
        format!("http://{}:{}/v2.0/", self.vip, self.keystone_port)
    }
}
