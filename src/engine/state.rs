// ABOUTME: Mutable per-run state for tasks and the workflow run
// ABOUTME: Owned and written only by the runner's coordinating loop

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::input::TaskInput;
use super::report::Termination;
use crate::provider::ProviderError;
use crate::registry::WorkflowTemplate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRunState {
    pub task_id: String,
    pub agent_id: String,
    pub status: TaskStatus,
    /// Seed before dispatch, the fully assembled input afterwards
    pub input: Option<TaskInput>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub round: Option<usize>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Settled result of one dispatched task, sent back to the coordinator.
#[derive(Debug)]
pub struct TaskOutcome {
    pub task_id: String,
    pub result: std::result::Result<String, ProviderError>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub run_id: String,
    pub workflow_id: String,
    pub task_states: IndexMap<String, TaskRunState>,
    pub results: IndexMap<String, String>,
    pub status: RunStatus,
    pub rounds: usize,
    pub started_at: DateTime<Utc>,
}

impl TaskRunState {
    pub fn new(task_id: String, agent_id: String) -> Self {
        Self {
            task_id,
            agent_id,
            status: TaskStatus::Pending,
            input: None,
            output: None,
            error: None,
            round: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn mark_started(&mut self, round: usize, input: TaskInput) {
        debug_assert_eq!(self.status, TaskStatus::Pending);
        self.status = TaskStatus::Running;
        self.round = Some(round);
        self.input = Some(input);
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self, output: String, finished_at: DateTime<Utc>) {
        debug_assert_eq!(self.status, TaskStatus::Running);
        self.status = TaskStatus::Completed;
        self.output = Some(output);
        self.finished_at = Some(finished_at);
    }

    pub fn mark_failed(&mut self, error: String, finished_at: DateTime<Utc>) {
        debug_assert_eq!(self.status, TaskStatus::Running);
        self.status = TaskStatus::Failed;
        self.error = Some(error);
        self.finished_at = Some(finished_at);
    }

    /// Seed value assigned at initialization, if any
    pub fn seed(&self) -> Option<Value> {
        self.input.as_ref().and_then(|input| input.seed.clone())
    }

    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).to_std().unwrap_or(Duration::ZERO)),
            _ => None,
        }
    }
}

impl WorkflowRun {
    /// Fresh run with every task `Pending` and the given tasks seeded
    pub fn new(run_id: String, template: &WorkflowTemplate, seeds: IndexMap<String, Value>) -> Self {
        let mut task_states = IndexMap::with_capacity(template.tasks.len());
        for task in &template.tasks {
            let mut state = TaskRunState::new(task.id.clone(), task.agent_id.clone());
            if let Some(seed) = seeds.get(&task.id) {
                state.input = Some(TaskInput::seeded(seed.clone()));
            }
            task_states.insert(task.id.clone(), state);
        }

        Self {
            run_id,
            workflow_id: template.id.clone(),
            task_states,
            results: IndexMap::new(),
            status: RunStatus::Running,
            rounds: 0,
            started_at: Utc::now(),
        }
    }

    /// Pending tasks whose every dependency has a stored result, in template order
    pub fn ready_tasks(&self, template: &WorkflowTemplate) -> Vec<String> {
        template
            .tasks
            .iter()
            .filter(|task| {
                self.task_states
                    .get(&task.id)
                    .is_some_and(|state| state.status == TaskStatus::Pending)
                    && task
                        .depends_on
                        .iter()
                        .all(|dependency| self.results.contains_key(dependency))
            })
            .map(|task| task.id.clone())
            .collect()
    }

    /// Record a settled task. The only writer of `task_states` and `results`
    /// while a run is in flight.
    pub fn apply_outcome(&mut self, outcome: TaskOutcome) {
        let Some(state) = self.task_states.get_mut(&outcome.task_id) else {
            return;
        };

        match outcome.result {
            Ok(output) => {
                state.mark_completed(output.clone(), outcome.finished_at);
                self.results.insert(outcome.task_id, output);
            }
            Err(error) => state.mark_failed(error.to_string(), outcome.finished_at),
        }
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.task_states
            .values()
            .filter(|state| state.status == status)
            .count()
    }

    pub fn task_ids_with(&self, status: TaskStatus) -> Vec<String> {
        self.task_states
            .values()
            .filter(|state| state.status == status)
            .map(|state| state.task_id.clone())
            .collect()
    }

    pub fn all_completed(&self) -> bool {
        self.task_states
            .values()
            .all(|state| state.status == TaskStatus::Completed)
    }

    /// Classify a run that has no ready tasks left
    pub fn settle(&self) -> Termination {
        let pending = self.task_ids_with(TaskStatus::Pending);
        let failed = self.task_ids_with(TaskStatus::Failed);

        if pending.is_empty() && failed.is_empty() {
            Termination::Completed
        } else if pending.is_empty() {
            Termination::TasksFailed { failed }
        } else {
            Termination::Deadlock { pending, failed }
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}
