// ABOUTME: Command implementations for the conductor CLI
// ABOUTME: Handles execution of the run, validate and list commands against a catalog file

use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::config::Config;
use crate::engine::{DependencyGraph, RunStatus, RunnerConfig, WorkflowRunner};
use crate::output::{OutputDestination, OutputFormat, OutputHandler};
use crate::registry::{AgentRegistry, CatalogFile, WorkflowCatalog, WorkflowValidator};

/// Per-invocation settings for `conductor run`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub catalog: PathBuf,
    pub workflow: String,
    pub input: Value,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub strict: bool,
    pub runner: RunnerConfig,
}

async fn load_catalog(path: &Path, strict: bool) -> Result<(AgentRegistry, WorkflowCatalog)> {
    let file = CatalogFile::from_file(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load catalog '{}': {}", path.display(), e))?;
    Ok(file.into_registries(strict)?)
}

/// Execute a workflow command
pub async fn run_workflow(options: RunOptions, config: &Config) -> Result<RunStatus> {
    info!(
        "Running workflow '{}' from {}",
        options.workflow,
        options.catalog.display()
    );

    let (agents, catalog) = load_catalog(&options.catalog, options.strict).await?;
    let provider = config.provider.build()?;

    let runner = WorkflowRunner::new(Arc::new(agents), Arc::new(catalog), provider)
        .with_config(options.runner);

    let report = runner
        .run(&options.workflow, options.input)
        .await
        .map_err(|e| anyhow::anyhow!("Workflow could not start: {}", e))?;

    let mut output_config = config.output.clone();
    if let Some(format) = options.format {
        output_config.format = format;
    }
    if let Some(path) = options.output {
        output_config.destination = OutputDestination::file(path);
    }

    OutputHandler::new(output_config).emit(&report).await?;

    info!(
        "Workflow '{}' finished with status {} after {} rounds",
        report.workflow_id, report.status, report.rounds
    );
    Ok(report.status)
}

/// Validate every workflow in a catalog, or just one
pub async fn validate_workflow(
    catalog_path: PathBuf,
    workflow: Option<String>,
    _config: &Config,
) -> Result<()> {
    info!("Validating catalog: {}", catalog_path.display());

    let file = CatalogFile::from_file(&catalog_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load catalog '{}': {}", catalog_path.display(), e))?;

    let mut agents = AgentRegistry::new();
    for agent in &file.agents {
        agents.register(agent.clone());
    }

    let templates: Vec<_> = match &workflow {
        Some(id) => {
            let selected: Vec<_> = file.workflows.iter().filter(|t| &t.id == id).collect();
            if selected.is_empty() {
                return Err(anyhow::anyhow!("Workflow not found: {}", id));
            }
            selected
        }
        None => file.workflows.iter().collect(),
    };

    let validator = WorkflowValidator::new().with_agents(&agents);
    let mut invalid = 0;

    for template in templates {
        let report = validator.validate(template);

        if report.is_valid {
            println!("✓ Workflow '{}' is valid", template.id);
            println!("  Tasks: {}", template.tasks.len());
            let plan = DependencyGraph::from_template(template).create_execution_plan()?;
            println!(
                "  Rounds: {} (up to {} tasks in parallel)",
                plan.execution_depth(),
                plan.max_parallelism()
            );
            for (round, batch) in plan.batches.iter().enumerate() {
                println!("  Round {}: {}", round + 1, batch.join(", "));
            }
        } else {
            invalid += 1;
            println!("✗ Workflow '{}' is invalid", template.id);
            for error in &report.errors {
                println!("  Error: {}", error);
            }
        }

        for warning in &report.warnings {
            println!("  Warning: {}", warning);
        }
    }

    if invalid > 0 {
        return Err(anyhow::anyhow!("{} workflow(s) failed validation", invalid));
    }

    info!("Catalog validation completed successfully");
    Ok(())
}

/// Print the agents and workflows of a catalog
pub async fn list_catalog(catalog_path: PathBuf, _config: &Config) -> Result<()> {
    let (agents, catalog) = load_catalog(&catalog_path, false).await?;

    println!("Agents ({}):", agents.len());
    for agent in agents.list() {
        let capabilities: Vec<&str> = agent.capabilities.iter().map(String::as_str).collect();
        if capabilities.is_empty() {
            println!("  {} - {}", agent.id, agent.name);
        } else {
            println!(
                "  {} - {} [{}]",
                agent.id,
                agent.name,
                capabilities.join(", ")
            );
        }
    }

    println!("Workflows ({}):", catalog.len());
    for template in catalog.list() {
        println!(
            "  {} - {} ({} tasks)",
            template.id,
            template.name,
            template.tasks.len()
        );
        if let Some(description) = &template.description {
            println!("      {}", description);
        }
    }

    Ok(())
}
