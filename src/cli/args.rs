// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the conductor CLI structure and its run, validate and list subcommands

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "conductor")]
#[command(about = "Runs multi-agent workflows with dependency-ordered parallel rounds")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a workflow from a catalog file
    Run {
        #[arg(help = "Path to catalog YAML file")]
        catalog: PathBuf,

        #[arg(help = "Id of the workflow to run")]
        workflow: String,

        #[arg(short, long, help = "Initial input text for the entry task")]
        input: Option<String>,

        #[arg(
            long,
            conflicts_with = "input",
            help = "Initial input for the entry task as JSON"
        )]
        input_json: Option<String>,

        #[arg(short, long, value_enum, help = "Report format")]
        format: Option<OutputFormat>,

        #[arg(short, long, help = "Write the report to this file instead of stdout")]
        output: Option<PathBuf>,

        #[arg(long, help = "Validate workflows strictly while loading the catalog")]
        strict: bool,

        #[arg(long, value_parser = humantime::parse_duration, help = "Timeout for each task (e.g. 30s)")]
        task_timeout: Option<Duration>,

        #[arg(long, value_parser = humantime::parse_duration, help = "Deadline for the whole run (e.g. 5m)")]
        deadline: Option<Duration>,

        #[arg(long, help = "Maximum number of rounds to execute")]
        max_rounds: Option<usize>,
    },

    /// Validate workflows in a catalog file without executing them
    Validate {
        #[arg(help = "Path to catalog YAML file")]
        catalog: PathBuf,

        #[arg(short, long, help = "Only validate this workflow")]
        workflow: Option<String>,
    },

    /// List the agents and workflows in a catalog file
    List {
        #[arg(help = "Path to catalog YAML file")]
        catalog: PathBuf,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build the initial run input from `--input` or `--input-json`
    pub fn parse_input(input: Option<&str>, input_json: Option<&str>) -> anyhow::Result<Value> {
        match (input, input_json) {
            (Some(text), _) => Ok(Value::String(text.to_string())),
            (None, Some(json)) => serde_json::from_str(json)
                .map_err(|e| anyhow::anyhow!("Invalid --input-json value: {}", e)),
            (None, None) => Ok(Value::Null),
        }
    }
}
