// ABOUTME: Immutable run report returned to callers once a workflow run settles
// ABOUTME: Per-task accounting, termination reason, results map and summary counts

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::dependency::DependencyGraph;
use super::input::TaskInput;
use super::state::{RunStatus, TaskStatus, WorkflowRun};
use crate::registry::WorkflowTemplate;

/// Why the round loop stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    Completed,
    /// Tasks remain pending but none can become ready
    Deadlock {
        pending: Vec<String>,
        failed: Vec<String>,
    },
    /// Nothing is left pending but at least one task failed
    TasksFailed { failed: Vec<String> },
    DeadlineExceeded {
        #[serde(with = "humantime_serde")]
        deadline: Duration,
    },
    RoundLimitExceeded { max_rounds: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub task_id: String,
    pub agent_id: String,
    pub status: TaskStatus,
    pub input: Option<TaskInput>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub round: Option<usize>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, with = "humantime_serde")]
    pub duration: Option<Duration>,
    /// Failed upstream tasks keeping this task from running
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub pending_tasks: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunReport {
    pub run_id: String,
    pub workflow_id: String,
    pub workflow_name: String,
    pub status: RunStatus,
    pub termination: Termination,
    pub rounds: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub tasks: Vec<TaskReport>,
    pub results: IndexMap<String, String>,
    pub summary: RunSummary,
}

impl Termination {
    pub fn is_completed(&self) -> bool {
        matches!(self, Termination::Completed)
    }
}

impl WorkflowRunReport {
    /// Freeze a settled run into its report
    pub fn from_run(
        run: WorkflowRun,
        template: &WorkflowTemplate,
        graph: &DependencyGraph,
        termination: Termination,
    ) -> Self {
        let finished_at = Utc::now();
        let duration = (finished_at - run.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        let tasks: Vec<TaskReport> = run
            .task_states
            .values()
            .map(|state| {
                let blocked_by = if state.status == TaskStatus::Pending {
                    graph
                        .get_transitive_dependencies(&state.task_id)
                        .into_iter()
                        .filter(|dependency| {
                            run.task_states
                                .get(dependency)
                                .is_some_and(|dep| dep.status == TaskStatus::Failed)
                        })
                        .collect()
                } else {
                    Vec::new()
                };

                TaskReport {
                    task_id: state.task_id.clone(),
                    agent_id: state.agent_id.clone(),
                    status: state.status,
                    input: state.input.clone(),
                    output: state.output.clone(),
                    error: state.error.clone(),
                    round: state.round,
                    started_at: state.started_at,
                    finished_at: state.finished_at,
                    duration: state.duration(),
                    blocked_by,
                }
            })
            .collect();

        let summary = RunSummary::from_tasks(&tasks);

        Self {
            run_id: run.run_id,
            workflow_id: run.workflow_id,
            workflow_name: template.name.clone(),
            status: run.status,
            termination,
            rounds: run.rounds,
            started_at: run.started_at,
            finished_at,
            duration,
            tasks,
            results: run.results,
            summary,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn get_task(&self, task_id: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|task| task.task_id == task_id)
    }

    pub fn tasks_with(&self, status: TaskStatus) -> impl Iterator<Item = &TaskReport> + '_ {
        self.tasks.iter().filter(move |task| task.status == status)
    }
}

impl RunSummary {
    fn from_tasks(tasks: &[TaskReport]) -> Self {
        let total = tasks.len();
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        let completed = count(TaskStatus::Completed);

        let success_rate = if total > 0 {
            (completed as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Self {
            total_tasks: total,
            completed_tasks: completed,
            failed_tasks: count(TaskStatus::Failed),
            pending_tasks: count(TaskStatus::Pending),
            success_rate,
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Completed => write!(f, "all tasks completed"),
            Termination::Deadlock { pending, failed } if failed.is_empty() => {
                write!(f, "deadlock: {} unreachable", pending.join(", "))
            }
            Termination::Deadlock { pending, failed } => write!(
                f,
                "deadlock: {} blocked after {} failed",
                pending.join(", "),
                failed.join(", ")
            ),
            Termination::TasksFailed { failed } => write!(f, "tasks failed: {}", failed.join(", ")),
            Termination::DeadlineExceeded { deadline } => {
                write!(f, "run deadline of {} exceeded", humantime::format_duration(*deadline))
            }
            Termination::RoundLimitExceeded { max_rounds } => {
                write!(f, "round limit of {} reached", max_rounds)
            }
        }
    }
}
