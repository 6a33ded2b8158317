// ABOUTME: Output handling for workflow run reports
// ABOUTME: Formats reports as JSON, YAML or text and writes them to stdout or a file

pub mod config;
pub mod error;
pub mod formatter;
pub mod writer;

pub use config::{OutputConfig, OutputDestination, OutputFormat, OutputOptions};
pub use error::{OutputError, Result};
pub use formatter::{formatter_for, JsonFormatter, ReportFormatter, TextFormatter, YamlFormatter};
pub use writer::{writer_for, FileWriter, OutputWriter, StdoutWriter};

use crate::engine::WorkflowRunReport;

pub struct OutputHandler {
    config: OutputConfig,
}

impl OutputHandler {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Render a report with the configured formatter
    pub fn render(&self, report: &WorkflowRunReport) -> Result<String> {
        formatter_for(self.config.format).format_report(report, &self.config.options)
    }

    /// Render a report and write it to the configured destination
    pub async fn emit(&self, report: &WorkflowRunReport) -> Result<()> {
        let content = self.render(report)?;
        writer_for(&self.config.destination).write(&content).await
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}
