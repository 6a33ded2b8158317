// ABOUTME: Error types raised before a workflow run starts
// ABOUTME: Per-task provider failures are recorded in the run report instead of returned here

use thiserror::Error;

use crate::registry::RegistryError;

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Task '{task_id}' in workflow '{workflow_id}' is assigned to unknown agent '{agent_id}'")]
    UnknownAgent {
        workflow_id: String,
        task_id: String,
        agent_id: String,
    },

    #[error("Entry task '{task_id}' is not part of workflow '{workflow_id}'")]
    UnknownEntryTask { workflow_id: String, task_id: String },

    #[error("Cannot seed task '{task_id}': not part of workflow '{workflow_id}'")]
    UnknownSeedTask { workflow_id: String, task_id: String },

    #[error("Duplicate task id '{task_id}' in workflow '{workflow_id}'")]
    DuplicateTask { workflow_id: String, task_id: String },
}

impl RunError {
    /// True when the run referenced a workflow or agent that is not registered
    pub fn is_not_found(&self) -> bool {
        match self {
            RunError::Registry(err) => err.is_not_found(),
            RunError::UnknownAgent { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;
