// ABOUTME: Configuration management for the conductor application
// ABOUTME: Loads logging, runner, provider and output settings from YAML and environment variables

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::RunnerConfig;
use crate::output::OutputConfig;
use crate::provider::{CapabilityProvider, CommandConfig, CommandProvider, EchoProvider};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Echo,
    Command,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Instantiate the configured capability provider
    pub fn build(&self) -> Result<Arc<dyn CapabilityProvider>> {
        match self.kind {
            ProviderKind::Echo => Ok(Arc::new(EchoProvider::new())),
            ProviderKind::Command => {
                let command = self.command.clone().ok_or_else(|| {
                    anyhow::anyhow!("provider.command is required when provider.kind is 'command'")
                })?;
                Ok(Arc::new(CommandProvider::new(CommandConfig {
                    command,
                    args: self.args.clone(),
                    env: self.env.clone(),
                    working_dir: self.working_dir.clone(),
                })))
            }
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "echo" => Ok(ProviderKind::Echo),
            "command" => Ok(ProviderKind::Command),
            other => Err(anyhow::anyhow!("Unknown provider kind '{}'", other)),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Some(p),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)?;
                serde_yaml::from_str(&contents)?
            }
            _ => Config::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let possible_paths = [
            PathBuf::from("conductor.yaml"),
            PathBuf::from("conductor.yml"),
            PathBuf::from(".conductor.yaml"),
            PathBuf::from(".conductor.yml"),
        ];

        if let Some(path) = possible_paths.into_iter().find(|p| p.exists()) {
            return Some(path);
        }

        dirs::home_dir()
            .map(|home| home.join(".conductor").join("config.yaml"))
            .filter(|p| p.exists())
    }

    /// Override settings from `CONDUCTOR_*` variables supplied by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("CONDUCTOR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("CONDUCTOR_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(timeout) = lookup("CONDUCTOR_TASK_TIMEOUT") {
            self.runner.task_timeout = Some(humantime::parse_duration(&timeout).map_err(|e| {
                anyhow::anyhow!("Invalid CONDUCTOR_TASK_TIMEOUT '{}': {}", timeout, e)
            })?);
        }
        if let Some(kind) = lookup("CONDUCTOR_PROVIDER") {
            self.provider.kind = kind.parse()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use std::time::Duration;

    #[test]
    fn test_config_from_yaml() {
        let config: Config = serde_yaml::from_str(
            r#"
logging:
  level: debug
  format: compact
runner:
  task_timeout: 30s
  max_rounds: 10
provider:
  kind: command
  command: ./agent.sh
  args: ["--fast"]
output:
  format: json
"#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.runner.task_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.runner.run_deadline, None);
        assert_eq!(config.runner.max_rounds, Some(10));
        assert_eq!(config.provider.kind, ProviderKind::Command);
        assert_eq!(config.provider.args, vec!["--fast"]);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> = [
            ("CONDUCTOR_LOG_LEVEL", "warn"),
            ("CONDUCTOR_TASK_TIMEOUT", "2m"),
            ("CONDUCTOR_PROVIDER", "command"),
        ]
        .into_iter()
        .collect();

        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.runner.task_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.provider.kind, ProviderKind::Command);
    }

    #[test]
    fn test_invalid_env_timeout() {
        let mut config = Config::default();
        let result = config.apply_env(|key| {
            (key == "CONDUCTOR_TASK_TIMEOUT").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_command_provider_requires_command() {
        let provider = ProviderConfig {
            kind: ProviderKind::Command,
            ..Default::default()
        };
        assert!(provider.build().is_err());

        let echo = ProviderConfig::default().build().unwrap();
        assert_eq!(echo.name(), "echo");
    }
}
