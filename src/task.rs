//! Rally task lifecycle
//!
//! One [`Task`] is one benchmark run: unstarted (no uuid) → started (uuid
//! assigned by Rally, discovered from the launch log) → finished/aborted,
//! observed through live status queries. Status is never cached.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;

use crate::cmd::{self, rally};
use crate::constants::{POLL_INTERVAL_SECS, TASK_ARGS_FILE, TASK_ID_POLL_TIMEOUT_SECS};
use crate::engine::BenchmarkEngine;
use crate::error::{HarnessError, HarnessResult};

static TASK_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Using task: ([a-z0-9-]+)").unwrap());

/// Task status as reported by the Rally CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Init,
    Running,
    Finished,
    Failed,
    Aborted,
    /// Any status token the harness does not model (verifying, cleaning
    /// up, …); kept verbatim.
    Other(String),
}

impl From<&str> for TaskStatus {
    fn from(token: &str) -> Self {
        match token {
            "init" => Self::Init,
            "running" => Self::Running,
            "finished" => Self::Finished,
            "failed" => Self::Failed,
            "aborted" => Self::Aborted,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
            Self::Failed => write!(f, "failed"),
            Self::Aborted => write!(f, "aborted"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One benchmark run of a single scenario.
pub struct Task {
    scenario: String,
    args: Option<serde_json::Value>,
    uuid: Option<String>,
}

impl Task {
    pub fn new(scenario: impl Into<String>, args: Option<serde_json::Value>) -> Self {
        Self {
            scenario: scenario.into(),
            args,
            uuid: None,
        }
    }

    /// Rally-assigned task id; `None` until [`start`](Self::start) has
    /// discovered it.
    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Log file the launch output is redirected to.
    pub fn log_file(&self) -> String {
        format!("{}_results.tmp.log", self.scenario)
    }

    /// Live status; `None` while unstarted.
    pub async fn status(&self, engine: &BenchmarkEngine) -> HarnessResult<Option<TaskStatus>> {
        match &self.uuid {
            None => Ok(None),
            Some(uuid) => Ok(Some(engine.get_task_status(uuid).await?)),
        }
    }

    /// Launch the scenario asynchronously and discover the assigned task id.
    ///
    /// Returns the log-file path. When the launch command itself fails the
    /// path is returned with the uuid left unset and only a warning logged;
    /// callers detect this failure mode by the absence of a uuid. (Long
    /// standing behavior — do not turn this into an error without checking
    /// the suites that rely on it.)
    pub async fn start(&mut self, engine: &BenchmarkEngine) -> HarnessResult<String> {
        let log_file = self.log_file();

        if let Some(args) = &self.args {
            let cmd = cmd::write_file(TASK_ARGS_FILE, &args.to_string());
            let result = engine.container().execute(&cmd).await?;
            if !result.success() {
                return Err(HarnessError::command_failed(cmd, &result));
            }
        }

        let cmd = rally::task_start(&self.scenario, TASK_ARGS_FILE, &log_file);
        let result = engine.container().execute(&cmd).await?;
        if !result.success() {
            tracing::warn!(
                scenario = %self.scenario,
                exit_code = result.exit_code,
                "Scenario failed to start"
            );
            return Ok(log_file);
        }
        tracing::info!(scenario = %self.scenario, "Started Rally task");

        // The task id only shows up in the log once Rally has registered
        // the run; poll for the marker line within a bounded window.
        let probe = rally::task_log_marker(&log_file);
        let deadline = Instant::now() + Duration::from_secs(TASK_ID_POLL_TIMEOUT_SECS);
        let marker = loop {
            let result = engine.container().execute(&probe).await?;
            if result.success() {
                break result;
            }
            if Instant::now() >= deadline {
                return Err(HarnessError::Timeout {
                    seconds: TASK_ID_POLL_TIMEOUT_SECS,
                    what: format!("task id of scenario {}", self.scenario),
                });
            }
            tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;
        };

        let line = marker.stdout.first().cloned().unwrap_or_default();
        let task_uuid = TASK_ID_RE
            .captures(&line)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| HarnessError::UnexpectedOutput {
                command: probe,
                reason: format!("cannot find task id in {line:?}"),
            })?;
        tracing::debug!(task = %task_uuid, "Discovered task id");

        let tasks = engine.list_tasks().await?;
        if !tasks.contains(&task_uuid) {
            return Err(HarnessError::TaskNotRegistered { uuid: task_uuid });
        }
        self.uuid = Some(task_uuid);
        Ok(log_file)
    }

    /// Abort the task, then require a terminal status.
    pub async fn abort(&self, engine: &BenchmarkEngine) -> HarnessResult<()> {
        let uuid = self.uuid.as_deref().ok_or(HarnessError::TaskNotStarted)?;
        tracing::debug!(task = %uuid, "Aborting Rally task");
        engine.container().execute(&rally::task_abort(uuid)).await?;
        let status = engine.get_task_status(uuid).await?;
        match status {
            TaskStatus::Finished | TaskStatus::Aborted => Ok(()),
            other => Err(HarnessError::AbortFailed {
                uuid: uuid.to_string(),
                status: other.to_string(),
            }),
        }
    }

    /// Results text, available only once the task has finished.
    ///
    /// `Ok(None)` means "not ready", not failure.
    pub async fn get_results(&self, engine: &BenchmarkEngine) -> HarnessResult<Option<String>> {
        let Some(uuid) = self.uuid.as_deref() else {
            return Ok(None);
        };
        if engine.get_task_status(uuid).await? != TaskStatus::Finished {
            return Ok(None);
        }
        let cmd = rally::task_results(uuid);
        let result = engine.container().execute(&cmd).await?;
        if !result.success() {
            return Err(HarnessError::command_failed(cmd, &result));
        }
        Ok(Some(result.stdout_joined()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::EngineConfig;
    use crate::test_utils::shell::{out, ScriptedShell};

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

    #[tokio::test(start_paused = true)]
    async fn test_start_discovers_task_id_from_log() {
        let (_, engine) = running_engine(
            ScriptedShell::new()
                .on("rally task start", out(0, &[]))
                .on_seq(
                    "grep -E '^Using task:'",
                    vec![out(1, &[]), out(0, &["Using task: abcd-1234"])],
                )
                .on("rally task list", out(0, &["abcd-1234"])),
        )
        .await;
        let mut task = Task::new("NovaServers.boot_and_delete", None);
        let log_file = task.start(&engine).await.unwrap();
        assert_eq!(log_file, "NovaServers.boot_and_delete_results.tmp.log");
        assert_eq!(task.uuid(), Some("abcd-1234"));
    }

    #[tokio::test]
    async fn test_start_writes_args_file_first() {
        let (shell, engine) = running_engine(
            ScriptedShell::new()
                .on("echo '{", out(0, &[]))
                .on("rally task start", out(0, &[]))
                .on("grep -E '^Using task:'", out(0, &["Using task: abcd-1234"]))
                .on("rally task list", out(0, &["abcd-1234"])),
        )
        .await;
        let args = serde_json::json!({"compute": 1});
        let mut task = Task::new("NovaServers.boot_and_delete", Some(args));
        task.start(&engine).await.unwrap();
        assert!(shell
            .commands()
            .iter()
            .any(|cmd| cmd.contains("> rally_args.json")));
    }

    #[tokio::test]
    async fn test_start_launch_failure_returns_log_without_uuid() {
        let (_, engine) =
            running_engine(ScriptedShell::new().on("rally task start", out(1, &[]))).await;
        let mut task = Task::new("NovaServers.boot_and_delete", None);
        let log_file = task.start(&engine).await.unwrap();
        assert_eq!(log_file, "NovaServers.boot_and_delete_results.tmp.log");
        assert_eq!(task.uuid(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_times_out_without_marker() {
        let (_, engine) = running_engine(
            ScriptedShell::new()
                .on("rally task start", out(0, &[]))
                .on("grep -E '^Using task:'", out(1, &[])),
        )
        .await;
        let mut task = Task::new("NovaServers.boot_and_delete", None);
        let err = task.start(&engine).await.unwrap_err();
        assert!(matches!(err, HarnessError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_start_rejects_id_missing_from_listing() {
        let (_, engine) = running_engine(
            ScriptedShell::new()
                .on("rally task start", out(0, &[]))
                .on("grep -E '^Using task:'", out(0, &["Using task: abcd-1234"]))
                .on("rally task list", out(0, &["other-uuid"])),
        )
        .await;
        let mut task = Task::new("NovaServers.boot_and_delete", None);
        let err = task.start(&engine).await.unwrap_err();
        assert!(matches!(err, HarnessError::TaskNotRegistered { .. }));
    }

    #[tokio::test]
    async fn test_status_is_none_while_unstarted() {
        let (_, engine) = running_engine(ScriptedShell::new()).await;
        let task = Task::new("NovaServers.boot_and_delete", None);
        assert_eq!(task.status(&engine).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_results_none_while_running() {
        let (_, engine) = running_engine(
            ScriptedShell::new()
                .on("rally task start", out(0, &[]))
                .on("grep -E '^Using task:'", out(0, &["Using task: abcd-1234"]))
                .on("rally task list", out(0, &["abcd-1234"]))
                .on("rally task status", out(0, &["Task abcd-1234: running"])),
        )
        .await;
        let mut task = Task::new("NovaServers.boot_and_delete", None);
        task.start(&engine).await.unwrap();
        assert_eq!(task.get_results(&engine).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_results_returns_text_when_finished() {
        let (_, engine) = running_engine(
            ScriptedShell::new()
                .on("rally task start", out(0, &[]))
                .on("grep -E '^Using task:'", out(0, &["Using task: abcd-1234"]))
                .on("rally task list", out(0, &["abcd-1234"]))
                .on("rally task status", out(0, &["Task abcd-1234: finished"]))
                .on("rally task results", out(0, &["[{\"full_duration\": 1.0}]"])),
        )
        .await;
        let mut task = Task::new("NovaServers.boot_and_delete", None);
        task.start(&engine).await.unwrap();
        let results = task.get_results(&engine).await.unwrap();
        assert_eq!(results.as_deref(), Some("[{\"full_duration\": 1.0}]"));
    }

    #[tokio::test]
    async fn test_abort_requires_terminal_status() {
        let (_, engine) = running_engine(
            ScriptedShell::new()
                .on("rally task start", out(0, &[]))
                .on("grep -E '^Using task:'", out(0, &["Using task: abcd-1234"]))
                .on("rally task list", out(0, &["abcd-1234"]))
                .on("rally task abort", out(0, &[]))
                .on("rally task status", out(0, &["Task abcd-1234: running"])),
        )
        .await;
        let mut task = Task::new("NovaServers.boot_and_delete", None);
        task.start(&engine).await.unwrap();
        let err = task.abort(&engine).await.unwrap_err();
        assert!(matches!(err, HarnessError::AbortFailed { .. }));
    }

    #[tokio::test]
    async fn test_abort_accepts_aborted_status() {
        let (_, engine) = running_engine(
            ScriptedShell::new()
                .on("rally task start", out(0, &[]))
                .on("grep -E '^Using task:'", out(0, &["Using task: abcd-1234"]))
                .on("rally task list", out(0, &["abcd-1234"]))
                .on("rally task abort", out(0, &[]))
                .on("rally task status", out(0, &["Task abcd-1234: aborted"])),
        )
        .await;
        let mut task = Task::new("NovaServers.boot_and_delete", None);
        task.start(&engine).await.unwrap();
        task.abort(&engine).await.unwrap();
    }

    #[test]
    fn test_status_token_parsing() {
        assert_eq!(TaskStatus::from("finished"), TaskStatus::Finished);
        assert_eq!(TaskStatus::from("aborted"), TaskStatus::Aborted);
        assert_eq!(
            TaskStatus::from("verifying"),
            TaskStatus::Other("verifying".to_string())
        );
    }
}
