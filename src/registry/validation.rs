// ABOUTME: Structural validation of workflow templates
// ABOUTME: Detects cycles, unknown dependencies, duplicate ids and unresolvable entry or agent references

use std::collections::HashSet;

use super::agent::AgentRegistry;
use super::error::RegistryError;
use super::workflow::WorkflowTemplate;
use crate::engine::DependencyGraph;

#[derive(Debug)]
pub struct ValidationReport {
    pub errors: Vec<RegistryError>,
    pub warnings: Vec<String>,
    pub is_valid: bool,
}

pub struct WorkflowValidator<'a> {
    agents: Option<&'a AgentRegistry>,
}

impl<'a> WorkflowValidator<'a> {
    pub fn new() -> Self {
        Self { agents: None }
    }

    /// Also require every assigned agent to be registered
    pub fn with_agents(mut self, agents: &'a AgentRegistry) -> Self {
        self.agents = Some(agents);
        self
    }

    pub fn validate(&self, template: &WorkflowTemplate) -> ValidationReport {
        let mut report = ValidationReport::new();

        if template.tasks.is_empty() {
            report.errors.push(RegistryError::EmptyWorkflow {
                workflow_id: template.id.clone(),
            });
        }

        self.validate_task_ids(template, &mut report);
        self.validate_dependencies(template, &mut report);
        self.validate_entry(template, &mut report);
        self.validate_agents(template, &mut report);

        report.is_valid = report.errors.is_empty();
        report
    }

    fn validate_task_ids(&self, template: &WorkflowTemplate, report: &mut ValidationReport) {
        let mut seen = HashSet::new();
        for task in &template.tasks {
            if !seen.insert(task.id.as_str()) {
                report.errors.push(RegistryError::DuplicateTask {
                    workflow_id: template.id.clone(),
                    task: task.id.clone(),
                });
            }
        }
    }

    fn validate_dependencies(&self, template: &WorkflowTemplate, report: &mut ValidationReport) {
        let graph = DependencyGraph::from_template(template);

        for (task, dependency) in graph.dangling_dependencies() {
            report.errors.push(RegistryError::UnknownDependency {
                workflow_id: template.id.clone(),
                task: task.clone(),
                dependency: dependency.clone(),
            });
        }

        for cycle in graph.find_cycles() {
            report.errors.push(RegistryError::CyclicDependency {
                workflow_id: template.id.clone(),
                tasks: cycle,
            });
        }

        for task in &template.tasks {
            let mut seen = HashSet::new();
            for dependency in &task.depends_on {
                if !seen.insert(dependency.as_str()) {
                    report.warnings.push(format!(
                        "task '{}' lists dependency '{}' more than once",
                        task.id, dependency
                    ));
                }
            }
        }
    }

    fn validate_entry(&self, template: &WorkflowTemplate, report: &mut ValidationReport) {
        let Some(entry) = template.entry_task() else {
            return;
        };

        match template.get_task(entry) {
            None => report.errors.push(RegistryError::UnknownEntryTask {
                workflow_id: template.id.clone(),
                task: entry.to_string(),
            }),
            Some(task) if !task.depends_on.is_empty() => report.warnings.push(format!(
                "entry task '{}' has dependencies and will not run first",
                task.id
            )),
            Some(_) => {}
        }
    }

    fn validate_agents(&self, template: &WorkflowTemplate, report: &mut ValidationReport) {
        let Some(agents) = self.agents else {
            return;
        };

        for agent_id in template.agent_ids() {
            if let Err(error) = agents.get(&agent_id) {
                report.errors.push(error);
            }
        }
    }
}

impl Default for WorkflowValidator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            is_valid: true,
        }
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Agent, TaskDefinition};

    #[test]
    fn test_valid_template() {
        let template = WorkflowTemplate::new("w1", "fan-out")
            .with_task(TaskDefinition::new("a", "echo"))
            .with_task(TaskDefinition::new("b", "echo").depends_on("a"));

        let report = WorkflowValidator::new().validate(&template);
        assert!(report.is_valid);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_structural_errors_are_collected() {
        let template = WorkflowTemplate::new("bad", "bad")
            .with_entry("nowhere")
            .with_task(TaskDefinition::new("a", "echo").depends_on("ghost"))
            .with_task(TaskDefinition::new("a", "echo"));

        let report = WorkflowValidator::new().validate(&template);
        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, RegistryError::DuplicateTask { task, .. } if task == "a")));
        assert!(report.errors.iter().any(
            |e| matches!(e, RegistryError::UnknownDependency { dependency, .. } if dependency == "ghost")
        ));
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, RegistryError::UnknownEntryTask { .. })));
    }

    #[test]
    fn test_empty_workflow() {
        let report = WorkflowValidator::new().validate(&WorkflowTemplate::new("e", "empty"));
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            RegistryError::EmptyWorkflow { workflow_id } if workflow_id == "e"
        ));
    }

    #[test]
    fn test_unknown_agents_with_registry() {
        let mut agents = AgentRegistry::new();
        agents.register(Agent::new("echo", "Echo", "repeats"));

        let template = WorkflowTemplate::new("w", "w")
            .with_task(TaskDefinition::new("a", "echo"))
            .with_task(TaskDefinition::new("b", "ghost"));

        let report = WorkflowValidator::new().with_agents(&agents).validate(&template);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            RegistryError::AgentNotFound { agent_id } if agent_id == "ghost"
        ));
    }

    #[test]
    fn test_entry_with_dependencies_warns() {
        let template = WorkflowTemplate::new("w", "w")
            .with_entry("b")
            .with_task(TaskDefinition::new("a", "echo"))
            .with_task(TaskDefinition::new("b", "echo").depends_on("a"));

        let report = WorkflowValidator::new().validate(&template);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
    }
}
