// ABOUTME: Workflow template definitions and the in-memory workflow catalog
// ABOUTME: Templates are ordered task lists with dependency edges referencing agents by id

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{RegistryError, Result};
use super::validation::WorkflowValidator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "agent", alias = "assigned_agent_id")]
    pub agent_id: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl TaskDefinition {
    pub fn new(id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            agent_id: agent_id.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.depends_on.push(dependency.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Task seeded with the caller's initial input. Falls back to the first task.
    #[serde(default)]
    pub entry: Option<String>,
    pub tasks: Vec<TaskDefinition>,
}

impl WorkflowTemplate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            entry: None,
            tasks: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_entry(mut self, task_id: impl Into<String>) -> Self {
        self.entry = Some(task_id.into());
        self
    }

    pub fn with_task(mut self, task: TaskDefinition) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn get_task(&self, task_id: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn has_task(&self, task_id: &str) -> bool {
        self.get_task(task_id).is_some()
    }

    /// Id of the task that receives the initial input
    pub fn entry_task(&self) -> Option<&str> {
        match self.entry {
            Some(ref entry) => Some(entry.as_str()),
            None => self.tasks.first().map(|task| task.id.as_str()),
        }
    }

    /// Distinct agent ids referenced by the tasks, in first-use order
    pub fn agent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for task in &self.tasks {
            if !ids.contains(&task.agent_id) {
                ids.push(task.agent_id.clone());
            }
        }
        ids
    }
}

/// Lookup table of workflow templates keyed by id.
///
/// By default registration never fails and does not inspect the graph; a
/// cyclic template is accepted and deadlocks at run time. Strict mode runs the
/// structural validator first and rejects defective templates.
#[derive(Debug, Clone, Default)]
pub struct WorkflowCatalog {
    templates: IndexMap<String, WorkflowTemplate>,
    strict_mode: bool,
}

impl WorkflowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict_mode
    }

    /// Insert or overwrite a template by id
    pub fn register(&mut self, template: WorkflowTemplate) -> Result<()> {
        if self.strict_mode {
            let report = WorkflowValidator::new().validate(&template);
            for warning in &report.warnings {
                warn!("Workflow '{}': {}", template.id, warning);
            }
            if let Some(error) = report.errors.into_iter().next() {
                return Err(error);
            }
        }

        debug!(
            "Registering workflow: {} ({} tasks)",
            template.id,
            template.tasks.len()
        );
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    pub fn get(&self, workflow_id: &str) -> Result<&WorkflowTemplate> {
        self.templates
            .get(workflow_id)
            .ok_or_else(|| RegistryError::WorkflowNotFound {
                workflow_id: workflow_id.to_string(),
            })
    }

    pub fn list(&self) -> impl Iterator<Item = &WorkflowTemplate> + '_ {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
