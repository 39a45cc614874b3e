//! rally-harness — drives Rally benchmarks from an integration-test suite
//!
//! The harness provisions and controls the Rally benchmarking tool inside
//! a Docker container on a remote host, reached only through an opaque
//! remote-shell channel (SSH in production). Everything the tools under
//! test expose is plain text, so the harness is mostly careful shell-string
//! construction on the way out and line-oriented scraping on the way back.
//!
//! # Architecture
//!
//! Leaf-first:
//! - **[`remote`]**: the remote-execution contract (`execute` / `upload`)
//! - **[`cmd`]**: shell command builders, one submodule per external tool
//! - **[`container`]**: one Docker container instance on the remote host
//! - **[`engine`]**: Rally image lifecycle plus parsed CLI queries
//! - **[`deployment`]**: lookup-or-create of the deployment record
//! - **[`task`]**: one benchmark run and its status state machine
//! - **[`results`]**: reduction of the results JSON to summary numbers
//! - **[`run`]**: the façade the test suites actually call

pub mod cmd;
pub mod config;
pub mod constants;
pub mod container;
pub mod deployment;
pub mod engine;
pub mod error;
pub mod remote;
pub mod results;
pub mod run;
pub mod task;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use config::{EngineConfig, TargetCloud};
pub use container::{RemoteContainer, RunOptions};
pub use deployment::Deployment;
pub use engine::BenchmarkEngine;
pub use error::{HarnessError, HarnessResult};
pub use remote::{CommandOutput, RemoteShell};
pub use results::{RallyResult, RunStats};
pub use run::BenchmarkRun;
pub use task::{Task, TaskStatus};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing for test runs.
///
/// Safe to call from every test; repeated initialization is ignored.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
