// ABOUTME: Run report formatters for JSON, YAML and human-readable text
// ABOUTME: Turns a WorkflowRunReport into the string a writer emits

use super::config::{OutputFormat, OutputOptions};
use super::error::{OutputError, Result};
use crate::engine::{TaskReport, TaskStatus, WorkflowRunReport};

pub trait ReportFormatter: Send + Sync {
    fn format_report(&self, report: &WorkflowRunReport, options: &OutputOptions) -> Result<String>;
}

#[derive(Debug, Default)]
pub struct JsonFormatter;

#[derive(Debug, Default)]
pub struct YamlFormatter;

#[derive(Debug, Default)]
pub struct TextFormatter;

/// Formatter for a configured format
pub fn formatter_for(format: OutputFormat) -> Box<dyn ReportFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Yaml => Box::new(YamlFormatter),
        OutputFormat::Text => Box::new(TextFormatter),
    }
}

impl ReportFormatter for JsonFormatter {
    fn format_report(&self, report: &WorkflowRunReport, options: &OutputOptions) -> Result<String> {
        if options.pretty_print {
            serde_json::to_string_pretty(report).map_err(OutputError::SerializationError)
        } else {
            serde_json::to_string(report).map_err(OutputError::SerializationError)
        }
    }
}

impl ReportFormatter for YamlFormatter {
    fn format_report(&self, report: &WorkflowRunReport, _options: &OutputOptions) -> Result<String> {
        serde_yaml::to_string(report).map_err(OutputError::YamlSerializationError)
    }
}

impl ReportFormatter for TextFormatter {
    fn format_report(&self, report: &WorkflowRunReport, options: &OutputOptions) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!(
            "Workflow: {} ({})\n",
            report.workflow_name, report.workflow_id
        ));
        output.push_str(&format!("Run ID: {}\n", report.run_id));
        output.push_str(&format!("Status: {}\n", report.status));
        output.push_str(&format!("Termination: {}\n", report.termination));
        output.push_str(&format!("Rounds: {}\n", report.rounds));

        if options.include_timestamps {
            output.push_str(&format!("Started: {}\n", report.started_at.to_rfc3339()));
            output.push_str(&format!("Finished: {}\n", report.finished_at.to_rfc3339()));
        }
        output.push_str(&format!(
            "Duration: {:.2}s\n",
            report.duration.as_secs_f64()
        ));

        output.push_str("\nSummary:\n");
        output.push_str(&format!("  Total tasks: {}\n", report.summary.total_tasks));
        output.push_str(&format!("  Completed: {}\n", report.summary.completed_tasks));
        output.push_str(&format!("  Failed: {}\n", report.summary.failed_tasks));
        output.push_str(&format!("  Pending: {}\n", report.summary.pending_tasks));
        output.push_str(&format!(
            "  Success rate: {:.1}%\n",
            report.summary.success_rate
        ));

        if !report.tasks.is_empty() {
            output.push_str("\nTasks:\n");
            for task in &report.tasks {
                output.push_str(&format_task_line(task, options));
                output.push('\n');
            }
        }

        Ok(output)
    }
}

fn format_task_line(task: &TaskReport, options: &OutputOptions) -> String {
    let marker = match task.status {
        TaskStatus::Completed => "✓",
        TaskStatus::Failed => "✗",
        TaskStatus::Running => "…",
        TaskStatus::Pending => "·",
    };

    let mut line = format!("  {} {} [{}] {}", marker, task.task_id, task.agent_id, task.status);
    if let Some(round) = task.round {
        line.push_str(&format!(" (round {})", round));
    }
    if let Some(duration) = task.duration {
        line.push_str(&format!(" [{:.2}s]", duration.as_secs_f64()));
    }

    if options.include_inputs {
        if let Some(input) = &task.input {
            let sources: Vec<&str> = input.dependencies.keys().map(String::as_str).collect();
            if input.seed.is_some() {
                line.push_str("\n    Input: seeded");
            }
            if !sources.is_empty() {
                line.push_str(&format!("\n    Inputs from: {}", sources.join(", ")));
            }
        }
    }

    if let Some(output) = &task.output {
        for (i, text) in options.truncate(output.trim()).lines().enumerate() {
            let label = if i == 0 { "Output: " } else { "        " };
            line.push_str(&format!("\n    {}{}", label, text));
        }
    }
    if let Some(error) = &task.error {
        line.push_str(&format!("\n    Error: {}", error));
    }
    if !task.blocked_by.is_empty() {
        line.push_str(&format!("\n    Blocked by: {}", task.blocked_by.join(", ")));
    }

    line
}
