// ABOUTME: Main application orchestration for the conductor CLI
// ABOUTME: Coordinates CLI arguments, configuration, logging and command dispatch

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands::{self, RunOptions};
use super::{Args, Commands, Config};
use crate::engine::RunStatus;

pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let log_level = if verbose {
            "debug"
        } else {
            &self.config.logging.level
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        // Reports go to stdout, so logs stay on stderr
        match self.config.logging.format.as_str() {
            "compact" => {
                tracing_subscriber::fmt()
                    .compact()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .try_init()
                    .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
            }
            _ => {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .try_init()
                    .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
            }
        }

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Run the application with parsed arguments
    pub async fn run(&mut self, args: Args) -> Result<()> {
        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting conductor v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        match args.command {
            Commands::Run {
                catalog,
                workflow,
                input,
                input_json,
                format,
                output,
                strict,
                task_timeout,
                deadline,
                max_rounds,
            } => {
                let mut runner = self.config.runner.clone();
                if let Some(timeout) = task_timeout {
                    runner.task_timeout = Some(timeout);
                }
                if let Some(deadline) = deadline {
                    runner.run_deadline = Some(deadline);
                }
                if let Some(max_rounds) = max_rounds {
                    runner.max_rounds = Some(max_rounds);
                }

                let options = RunOptions {
                    catalog,
                    input: Args::parse_input(input.as_deref(), input_json.as_deref())?,
                    workflow,
                    format,
                    output,
                    strict,
                    runner,
                };

                match commands::run_workflow(options, &self.config).await? {
                    RunStatus::Completed => Ok(()),
                    status => Err(anyhow::anyhow!(
                        "Workflow execution failed with status: {}",
                        status
                    )),
                }
            }

            Commands::Validate { catalog, workflow } => {
                commands::validate_workflow(catalog, workflow, &self.config).await
            }

            Commands::List { catalog } => commands::list_catalog(catalog, &self.config).await,
        }
    }

    /// Create application from parsed arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Config::load(args.config.clone())?;
        Ok(Self::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_app_creation() {
        let app = App::new(Config::default());
        assert_eq!(app.config().logging.level, "info");
        assert_eq!(app.config().runner.max_rounds, None);
    }

    #[test]
    fn test_config_file_loading() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("conductor.yaml");

        fs::write(
            &config_path,
            "logging:\n  level: debug\n  format: compact\nrunner:\n  max_rounds: 8\n",
        )
        .unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.runner.max_rounds, Some(8));
        assert_eq!(config.logging.format, "compact");
    }
}
