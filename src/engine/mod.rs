// ABOUTME: Workflow execution engine for conductor
// ABOUTME: Dependency analysis, per-run state, input assembly, the round-based runner and reports

pub mod dependency;
pub mod error;
pub mod input;
pub mod report;
pub mod runner;
pub mod state;

pub use dependency::{DependencyGraph, ExecutionPlan};
pub use error::{Result, RunError};
pub use input::TaskInput;
pub use report::{RunSummary, TaskReport, Termination, WorkflowRunReport};
pub use runner::{RunnerConfig, WorkflowRunner};
pub use state::{RunStatus, TaskOutcome, TaskRunState, TaskStatus, WorkflowRun};
