//! Harness-wide constants
//!
//! Fixed values used when provisioning the Rally container and when
//! driving benchmark runs. Grouped by purpose.

// =============================================================================
// IMAGE DEFAULTS
// =============================================================================

/// Default Docker repository for the Rally image
pub const DEFAULT_CONTAINER_REPO: &str = "rallyforge/rally";

/// Tag of the freshly pulled base image
pub const BASE_TAG: &str = "latest";

/// Tag under which the provisioned image is committed
pub const READY_TAG: &str = "ready";

// =============================================================================
// CONTAINER PATHS
// =============================================================================

/// Default host directory bind-mounted as the Rally home
pub const DEFAULT_HOME_DIR: &str = "/var/rally_home";

/// Mount point of the Rally home inside the container
pub const HOME_BIND_PATH: &str = "/home/rally";

/// Plugin directory inside the container (also the host-side bind source)
pub const PLUGINS_DIR: &str = "/opt/rally/plugins";

/// Rally database file, relative to the container working directory
pub const RALLY_DB_FILE: &str = ".rally.sqlite";

/// Deployment config document written inside the container
pub const DEPLOYMENT_CONFIG_FILE: &str = "depl.conf";

/// Task arguments file referenced by `rally task start`
pub const TASK_ARGS_FILE: &str = "rally_args.json";

// =============================================================================
// PROVISIONING
// =============================================================================

/// Packages installed into the container during image preparation
pub const UTIL_PACKAGES: &[&str] = &["gawk", "vim", "curl", "firefox", "python-pip", "xvfb"];

/// Pip packages required by the browser-automation plugins
pub const PIP_PACKAGES: &[&str] = &["pyvirtualdisplay", "selenium", "xvfbwrapper"];

/// Geckodriver release installed for browser-automation scenarios
pub const GECKODRIVER_URL: &str = "https://github.com/mozilla/geckodriver/releases/download/v0.10.0/geckodriver-v0.10.0-linux64.tar.gz";

// =============================================================================
// TIMEOUTS
// =============================================================================

/// How long to poll the task log for the assigned task id
pub const TASK_ID_POLL_TIMEOUT_SECS: u64 = 30;

/// Interval between polls of the task log and of the task status
pub const POLL_INTERVAL_SECS: u64 = 1;

/// Default overall benchmark-run timeout
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// TARGET CLOUD DEFAULTS
// =============================================================================

/// Default Keystone port of the cloud under test
pub const DEFAULT_KEYSTONE_PORT: u16 = 5000;
