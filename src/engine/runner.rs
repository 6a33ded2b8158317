// ABOUTME: Round-based workflow runner driving a template's tasks to a terminal state
// ABOUTME: Dispatches each ready set concurrently and waits on a channel barrier between rounds

use futures::future::join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::dependency::DependencyGraph;
use super::error::{Result, RunError};
use super::input::TaskInput;
use super::report::{Termination, WorkflowRunReport};
use super::state::{RunStatus, TaskOutcome, TaskStatus, WorkflowRun};
use crate::provider::{CapabilityProvider, CapabilityRequest, ProviderError};
use crate::registry::{Agent, AgentRegistry, WorkflowCatalog, WorkflowTemplate};

/// Optional bounds on a run. All are off by default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Limit on a single provider call
    #[serde(default, with = "humantime_serde")]
    pub task_timeout: Option<Duration>,
    /// Limit on the whole run, checked before each round
    #[serde(default, with = "humantime_serde")]
    pub run_deadline: Option<Duration>,
    #[serde(default)]
    pub max_rounds: Option<usize>,
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    pub fn with_run_deadline(mut self, deadline: Duration) -> Self {
        self.run_deadline = Some(deadline);
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }
}

pub struct WorkflowRunner {
    agents: Arc<AgentRegistry>,
    catalog: Arc<WorkflowCatalog>,
    provider: Arc<dyn CapabilityProvider>,
    config: RunnerConfig,
}

impl WorkflowRunner {
    pub fn new(
        agents: Arc<AgentRegistry>,
        catalog: Arc<WorkflowCatalog>,
        provider: Arc<dyn CapabilityProvider>,
    ) -> Self {
        Self {
            agents,
            catalog,
            provider,
            config: RunnerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run a workflow with `initial_input` seeded into its entry task.
    ///
    /// Unknown workflows, unknown agents and an entry naming no task fail
    /// before any task executes. Every other outcome, including failed tasks
    /// and deadlocks, is returned as a report.
    #[instrument(skip(self, initial_input), fields(provider = self.provider.name()))]
    pub async fn run(&self, workflow_id: &str, initial_input: Value) -> Result<WorkflowRunReport> {
        let template = self.catalog.get(workflow_id)?;

        let mut seeds = IndexMap::new();
        if let Some(entry) = &template.entry {
            if !template.has_task(entry) {
                return Err(RunError::UnknownEntryTask {
                    workflow_id: template.id.clone(),
                    task_id: entry.clone(),
                });
            }
        }
        if let Some(entry) = template.entry_task() {
            seeds.insert(entry.to_string(), initial_input);
        }

        self.execute(template, seeds).await
    }

    /// Run a workflow seeding each named task with its own value
    #[instrument(skip(self, inputs), fields(provider = self.provider.name()))]
    pub async fn run_with_inputs(
        &self,
        workflow_id: &str,
        inputs: IndexMap<String, Value>,
    ) -> Result<WorkflowRunReport> {
        let template = self.catalog.get(workflow_id)?;

        if let Some(unknown) = inputs.keys().find(|task_id| !template.has_task(task_id)) {
            return Err(RunError::UnknownSeedTask {
                workflow_id: template.id.clone(),
                task_id: unknown.clone(),
            });
        }

        self.execute(template, inputs).await
    }

    async fn execute(
        &self,
        template: &WorkflowTemplate,
        seeds: IndexMap<String, Value>,
    ) -> Result<WorkflowRunReport> {
        let agents = self.resolve_agents(template)?;

        let graph = DependencyGraph::from_template(template);
        for (task_id, dependency) in graph.dangling_dependencies() {
            warn!(
                "Task '{}' depends on unknown task '{}'; it will never become ready",
                task_id, dependency
            );
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        let mut run = WorkflowRun::new(run_id, template, seeds);
        let clock = Instant::now();

        info!(
            "Starting workflow '{}' with {} tasks (run_id: {})",
            template.id,
            template.tasks.len(),
            run.run_id
        );

        let termination = loop {
            let ready = run.ready_tasks(template);

            if ready.is_empty() {
                // Rounds only advance after every dispatched task has settled
                debug_assert_eq!(run.count(TaskStatus::Running), 0);
                break run.settle();
            }

            if let Some(deadline) = self.config.run_deadline {
                if clock.elapsed() >= deadline {
                    break Termination::DeadlineExceeded { deadline };
                }
            }

            if let Some(max_rounds) = self.config.max_rounds {
                if run.rounds >= max_rounds {
                    break Termination::RoundLimitExceeded { max_rounds };
                }
            }

            run.rounds += 1;
            info!(
                "Round {}: dispatching {} tasks: {:?}",
                run.rounds,
                ready.len(),
                ready
            );
            self.execute_round(&mut run, template, &agents, &ready).await;
        };

        run.status = if termination.is_completed() {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };

        match &termination {
            Termination::Completed => info!(
                "Workflow '{}' completed in {} rounds ({:?})",
                template.id,
                run.rounds,
                clock.elapsed()
            ),
            other => warn!("Workflow '{}' failed: {}", template.id, other),
        }

        Ok(WorkflowRunReport::from_run(run, template, &graph, termination))
    }

    /// Look up every agent the template references, failing on the first unknown one
    fn resolve_agents(&self, template: &WorkflowTemplate) -> Result<HashMap<String, Agent>> {
        let mut seen = HashSet::new();
        let mut agents = HashMap::new();

        for task in &template.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(RunError::DuplicateTask {
                    workflow_id: template.id.clone(),
                    task_id: task.id.clone(),
                });
            }

            if agents.contains_key(&task.agent_id) {
                continue;
            }
            let agent = self
                .agents
                .get(&task.agent_id)
                .map_err(|_| RunError::UnknownAgent {
                    workflow_id: template.id.clone(),
                    task_id: task.id.clone(),
                    agent_id: task.agent_id.clone(),
                })?;
            agents.insert(task.agent_id.clone(), agent.clone());
        }

        Ok(agents)
    }

    async fn execute_round(
        &self,
        run: &mut WorkflowRun,
        template: &WorkflowTemplate,
        agents: &HashMap<String, Agent>,
        ready: &[String],
    ) {
        let round = run.rounds;
        let (tx, mut rx) = mpsc::unbounded_channel::<TaskOutcome>();
        let mut handles = Vec::with_capacity(ready.len());

        for task_id in ready {
            let (Some(task), Some(state)) =
                (template.get_task(task_id), run.task_states.get_mut(task_id))
            else {
                continue;
            };
            let Some(agent) = agents.get(&task.agent_id) else {
                continue;
            };

            let input = TaskInput::assemble(state.seed(), &task.depends_on, &run.results);
            let context = input.render(&task.description);
            state.mark_started(round, input);

            let request = CapabilityRequest {
                run_id: run.run_id.clone(),
                task_id: task.id.clone(),
                agent_id: agent.id.clone(),
                description: task.description.clone(),
                role: agent.role.clone(),
                context,
            };

            let provider = Arc::clone(&self.provider);
            let tx = tx.clone();
            let task_timeout = self.config.task_timeout;

            let handle = tokio::spawn(async move {
                debug!("Starting task {} on agent {}", request.task_id, request.agent_id);
                let result = invoke(provider.as_ref(), &request, task_timeout).await;
                // The receiver lives until the round settles
                let _ = tx.send(TaskOutcome {
                    task_id: request.task_id,
                    result,
                    finished_at: chrono::Utc::now(),
                });
            });
            handles.push((task_id.clone(), handle));
        }
        drop(tx);

        let mut settled = HashSet::new();
        while let Some(outcome) = rx.recv().await {
            match &outcome.result {
                Ok(_) => debug!("Task {} completed", outcome.task_id),
                Err(err) => error!("Task {} failed: {}", outcome.task_id, err),
            }
            settled.insert(outcome.task_id.clone());
            run.apply_outcome(outcome);
        }

        // Channel closed: every spawned task has finished or been dropped
        let (task_ids, handles): (Vec<String>, Vec<_>) = handles.into_iter().unzip();
        let mut aborted: HashMap<String, String> = task_ids
            .into_iter()
            .zip(join_all(handles).await)
            .filter_map(|(task_id, result)| result.err().map(|e| (task_id, abort_reason(e))))
            .collect();

        for task_id in ready {
            let dispatched = run
                .task_states
                .get(task_id)
                .is_some_and(|state| state.status == TaskStatus::Running);
            if !dispatched || settled.contains(task_id) {
                continue;
            }

            let reason = aborted
                .remove(task_id)
                .unwrap_or_else(|| "no outcome reported".to_string());
            error!("Task {} aborted: {}", task_id, reason);
            run.apply_outcome(TaskOutcome {
                task_id: task_id.clone(),
                result: Err(ProviderError::Failed(format!("task aborted: {}", reason))),
                finished_at: chrono::Utc::now(),
            });
        }
    }
}

/// Panic message of a spawned task, or the join error itself when it was cancelled
fn abort_reason(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

/// Call the provider once, applying the per-task timeout and rejecting blank output
async fn invoke(
    provider: &dyn CapabilityProvider,
    request: &CapabilityRequest,
    task_timeout: Option<Duration>,
) -> std::result::Result<String, ProviderError> {
    let result = match task_timeout {
        Some(limit) => match tokio::time::timeout(limit, provider.execute(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout { timeout: limit }),
        },
        None => provider.execute(request).await,
    };

    match result {
        Ok(output) if output.trim().is_empty() => Err(ProviderError::EmptyResponse),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::EchoProvider;
    use crate::registry::TaskDefinition;
    use async_trait::async_trait;
    use serde_json::json;

    struct FailingProvider;

    #[async_trait]
    impl CapabilityProvider for FailingProvider {
        async fn execute(&self, _request: &CapabilityRequest) -> crate::provider::Result<String> {
            Err(ProviderError::RateLimited { retry_after: None })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn runner_with(provider: Arc<dyn CapabilityProvider>) -> WorkflowRunner {
        let mut agents = AgentRegistry::new();
        agents.register(Agent::new("echo", "Echo", "Repeats its input"));

        let mut catalog = WorkflowCatalog::new();
        catalog
            .register(
                WorkflowTemplate::new("w1", "Fan-out")
                    .with_task(TaskDefinition::new("a", "echo"))
                    .with_task(TaskDefinition::new("b", "echo").depends_on("a"))
                    .with_task(TaskDefinition::new("c", "echo").depends_on("a")),
            )
            .unwrap();

        WorkflowRunner::new(Arc::new(agents), Arc::new(catalog), provider)
    }

    #[tokio::test]
    async fn test_fan_out_completes_in_two_rounds() {
        let runner = runner_with(Arc::new(EchoProvider::new()));
        let report = runner.run("w1", json!("x")).await.unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.termination, Termination::Completed);
        assert_eq!(report.rounds, 2);
        assert_eq!(report.get_task("a").unwrap().round, Some(1));
        assert_eq!(report.get_task("b").unwrap().round, Some(2));
        assert_eq!(report.get_task("c").unwrap().round, Some(2));
        for id in ["a", "b", "c"] {
            assert_eq!(report.results[id], "x");
        }
    }

    #[tokio::test]
    async fn test_failed_entry_deadlocks_dependents() {
        let runner = runner_with(Arc::new(FailingProvider));
        let report = runner.run("w1", json!("x")).await.unwrap();

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.rounds, 1);
        assert!(report.results.is_empty());
        assert!(matches!(report.termination, Termination::Deadlock { .. }));
        assert_eq!(report.get_task("a").unwrap().status, TaskStatus::Failed);
        assert_eq!(report.get_task("b").unwrap().status, TaskStatus::Pending);
        assert_eq!(report.get_task("c").unwrap().blocked_by, vec!["a"]);
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_not_found() {
        let runner = runner_with(Arc::new(EchoProvider::new()));
        let err = runner.run("missing", json!("x")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_seed_task_rejected() {
        let runner = runner_with(Arc::new(EchoProvider::new()));
        let mut inputs = IndexMap::new();
        inputs.insert("z".to_string(), json!("x"));

        let err = runner.run_with_inputs("w1", inputs).await.unwrap_err();
        assert!(matches!(err, RunError::UnknownSeedTask { .. }));
    }

    #[tokio::test]
    async fn test_round_limit_stops_run() {
        let runner = runner_with(Arc::new(EchoProvider::new()))
            .with_config(RunnerConfig::new().with_max_rounds(1));
        let report = runner.run("w1", json!("x")).await.unwrap();

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.termination, Termination::RoundLimitExceeded { max_rounds: 1 });
        assert_eq!(report.get_task("a").unwrap().status, TaskStatus::Completed);
        assert_eq!(report.get_task("b").unwrap().status, TaskStatus::Pending);
    }
}
