// ABOUTME: Configuration types for report output
// ABOUTME: Selects the report format, where it goes and how much detail it carries

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use super::error::OutputError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Yaml,
    #[default]
    Text,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputDestination {
    #[default]
    Stdout,
    File {
        path: PathBuf,
        #[serde(default = "default_true")]
        create_dirs: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputOptions {
    /// Show each task's assembled input in text reports
    #[serde(default)]
    pub include_inputs: bool,
    #[serde(default)]
    pub include_timestamps: bool,
    #[serde(default)]
    pub max_output_length: Option<usize>,
    #[serde(default = "default_true")]
    pub pretty_print: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub destination: OutputDestination,
    #[serde(default)]
    pub options: OutputOptions,
}

fn default_true() -> bool {
    true
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            include_inputs: false,
            include_timestamps: false,
            max_output_length: None,
            pretty_print: true,
        }
    }
}

impl OutputDestination {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        OutputDestination::File {
            path: path.into(),
            create_dirs: true,
        }
    }
}

impl OutputOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_all(mut self) -> Self {
        self.include_inputs = true;
        self.include_timestamps = true;
        self
    }

    pub fn with_max_output_length(mut self, length: usize) -> Self {
        self.max_output_length = Some(length);
        self
    }

    /// Shorten `text` to the configured limit on a char boundary
    pub fn truncate<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_output_length {
            Some(limit) if text.chars().count() > limit => {
                let cut: String = text.chars().take(limit).collect();
                std::borrow::Cow::Owned(format!("{}... [truncated]", cut))
            }
            _ => std::borrow::Cow::Borrowed(text),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(OutputError::UnknownFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}
