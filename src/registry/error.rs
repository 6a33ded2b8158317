// ABOUTME: Error types for agent registry and workflow catalog operations
// ABOUTME: Covers lookups of unknown ids and structural defects found by strict validation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Agent not found: {agent_id}")]
    AgentNotFound { agent_id: String },

    #[error("Workflow not found: {workflow_id}")]
    WorkflowNotFound { workflow_id: String },

    #[error("Circular dependency detected in workflow '{workflow_id}': {tasks:?}")]
    CyclicDependency {
        workflow_id: String,
        tasks: Vec<String>,
    },

    #[error("Task '{task}' in workflow '{workflow_id}' depends on unknown task '{dependency}'")]
    UnknownDependency {
        workflow_id: String,
        task: String,
        dependency: String,
    },

    #[error("Duplicate task id '{task}' in workflow '{workflow_id}'")]
    DuplicateTask { workflow_id: String, task: String },

    #[error("Workflow '{workflow_id}' has no tasks")]
    EmptyWorkflow { workflow_id: String },

    #[error("Entry task '{task}' is not part of workflow '{workflow_id}'")]
    UnknownEntryTask { workflow_id: String, task: String },

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RegistryError {
    /// True for lookups of ids that were never registered
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::AgentNotFound { .. } | RegistryError::WorkflowNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
