//! `docker` CLI command strings
//!
//! The container runtime lives on the remote host and is only reachable as
//! shell commands; these builders produce the exact strings the harness
//! executes over the channel.

use super::escape_double_quoted;

/// Options for a detached-interactive `docker run`.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Numeric or named user to run as
    pub user: Option<String>,
    /// `(outside, inside)` bind-mount pairs
    pub bindings: Vec<(String, String)>,
    /// `(name, value)` environment pairs
    pub env_vars: Vec<(String, String)>,
    /// Network mode (e.g. `host`)
    pub network: Option<String>,
}

/// Launch a detached interactive container running `/bin/bash`.
pub fn run(image: &str, opts: &RunOptions) -> String {
    let mut cmd = String::from("docker run -d -ti");
    if let Some(user) = &opts.user {
        cmd.push_str(&format!(" --user {user}"));
    }
    for (outside, inside) in &opts.bindings {
        cmd.push_str(&format!(" -v {outside}:{inside}"));
    }
    for (name, value) in &opts.env_vars {
        cmd.push_str(&format!(" -e {name}={value}"));
    }
    if let Some(network) = &opts.network {
        cmd.push_str(&format!(" --net={network}"));
    }
    format!("{cmd} {image} /bin/bash")
}

/// Id of the most-recently-created container.
pub fn last_container_id() -> String {
    "docker ps -lq".to_string()
}

/// Run `inner` inside the container via `bash -c`.
pub fn exec(id: &str, inner: &str) -> String {
    format!("docker exec {id} /bin/bash -c \"{}\"", escape_double_quoted(inner))
}

/// List local images as `repository tag` pairs, one per line.
pub fn images() -> String {
    r#"docker images | awk 'NR > 1 {print $1" "$2}'"#.to_string()
}

pub fn pull(repo: &str) -> String {
    format!("docker pull {repo}")
}

pub fn commit(id: &str, repotag: &str) -> String {
    format!("docker commit {id} {repotag}")
}

pub fn stop(id: &str) -> String {
    format!("docker stop {id}")
}

pub fn remove(id: &str) -> String {
    format!("docker rm {id}")
}
