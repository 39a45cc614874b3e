//! Top-level façade for one benchmark invocation
//!
//! [`BenchmarkRun`] wires an engine, a deployment and a task together the
//! way the integration tests consume them: set everything up once, run
//! one scenario to completion, hand back the parsed numbers.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::{EngineConfig, TargetCloud};
use crate::constants::{DEFAULT_RUN_TIMEOUT_SECS, POLL_INTERVAL_SECS};
use crate::deployment::Deployment;
use crate::engine::BenchmarkEngine;
use crate::error::{HarnessError, HarnessResult};
use crate::remote::RemoteShell;
use crate::results::RallyResult;
use crate::task::{Task, TaskStatus};

pub struct BenchmarkRun {
    engine: BenchmarkEngine,
    deployment: Deployment,
    scenario: String,
    task_args: Option<serde_json::Value>,
    current_task: Option<Task>,
}

impl BenchmarkRun {
    pub fn new(
        shell: Arc<dyn RemoteShell>,
        config: EngineConfig,
        target: TargetCloud,
        scenario: impl Into<String>,
        task_args: Option<serde_json::Value>,
    ) -> Self {
        let proxy_url = config.proxy_url.clone();
        Self {
            engine: BenchmarkEngine::new(shell, config),
            deployment: Deployment::new(target, proxy_url),
            scenario: scenario.into(),
            task_args,
            current_task: None,
        }
    }

    pub fn engine(&self) -> &BenchmarkEngine {
        &self.engine
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.current_task.as_ref()
    }

    /// Bring the engine up and register the deployment record.
    ///
    /// Deployment creation is forced so a stale record from a previous
    /// suite run never shadows the current credentials.
    pub async fn setup(&mut self) -> HarnessResult<()> {
        self.engine.setup().await?;
        self.deployment.create(&self.engine, true).await
    }

    /// [`run`](Self::run) with the default overall timeout.
    pub async fn run_default(&mut self) -> HarnessResult<RallyResult> {
        self.run(Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS)).await
    }

    /// Run the scenario to completion and parse its results.
    pub async fn run(&mut self, timeout: Duration) -> HarnessResult<RallyResult> {
        let mut task = Task::new(self.scenario.clone(), self.task_args.clone());
        tracing::info!(scenario = %self.scenario, "Starting Rally benchmark test…");
        let outcome = Self::drive(&self.engine, &mut task, timeout).await;
        self.current_task = Some(task);
        outcome
    }

    /// Abort the current task, if any was started.
    pub async fn abort(&self) -> HarnessResult<()> {
        match &self.current_task {
            Some(task) => task.abort(&self.engine).await,
            None => Ok(()),
        }
    }

    async fn drive(
        engine: &BenchmarkEngine,
        task: &mut Task,
        timeout: Duration,
    ) -> HarnessResult<RallyResult> {
        task.start(engine).await?;
        let Some(uuid) = task.uuid().map(str::to_string) else {
            // Launch failed silently; surface it here, where results are
            // expected.
            return Err(HarnessError::TaskNotStarted);
        };

        let deadline = Instant::now() + timeout;
        loop {
            match engine.get_task_status(&uuid).await? {
                TaskStatus::Finished => break,
                status @ (TaskStatus::Failed | TaskStatus::Aborted) => {
                    return Err(HarnessError::TaskEnded {
                        uuid: uuid.clone(),
                        status: status.to_string(),
                    });
                }
                _ => {}
            }
            if Instant::now() >= deadline {
                return Err(HarnessError::Timeout {
                    seconds: timeout.as_secs(),
                    what: format!("benchmark task {uuid} to finish"),
                });
            }
            tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;
        }
        tracing::info!(task = %uuid, "Rally benchmark test is finished");

        let text = task
            .get_results(engine)
            .await?
            .ok_or_else(|| HarnessError::UnexpectedOutput {
                command: format!("rally task results {uuid}"),
                reason: "no results after task finished".to_string(),
            })?;
        let parsed = RallyResult::parse(&text)?;
        tracing::info!(
            full_duration = parsed.stats.full_duration,
            load_duration = parsed.stats.load_duration,
            errors = parsed.stats.errors,
            "Rally benchmark results parsed"
        );
        Ok(parsed)
    }
}
