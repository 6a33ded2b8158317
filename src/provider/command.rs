// ABOUTME: Provider that runs an external program once per task
// ABOUTME: Feeds the rendered context on stdin and takes trimmed stdout as the task output

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::error::{ProviderError, Result};
use super::{CapabilityProvider, CapabilityRequest};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CommandProvider {
    config: CommandConfig,
}

impl CommandProvider {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }

    /// Shorthand for a program with arguments and no extra environment
    pub fn program(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::new(CommandConfig {
            command: command.into(),
            args,
            ..Default::default()
        })
    }

    fn build_command(&self, request: &CapabilityRequest) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args);

        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }
        cmd.env("CONDUCTOR_ROLE", &request.role)
            .env("CONDUCTOR_TASK_ID", &request.task_id)
            .env("CONDUCTOR_AGENT_ID", &request.agent_id)
            .env("CONDUCTOR_RUN_ID", &request.run_id);

        if let Some(ref working_dir) = self.config.working_dir {
            cmd.current_dir(working_dir);
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CapabilityProvider for CommandProvider {
    async fn execute(&self, request: &CapabilityRequest) -> Result<String> {
        debug!(
            "Spawning {} {:?} for task {}",
            self.config.command, self.config.args, request.task_id
        );

        let mut child = self.build_command(request).spawn().map_err(|e| {
            ProviderError::Failed(format!("failed to spawn '{}': {}", self.config.command, e))
        })?;

        // stdin is fed while stdout drains; sequencing them deadlocks on full pipes
        let stdin = child.stdin.take();
        let context = request.context.as_bytes();
        let feed = async move {
            match stdin {
                Some(mut stdin) => stdin.write_all(context).await,
                None => Ok(()),
            }
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());

        let output =
            output.map_err(|e| ProviderError::Failed(format!("failed to wait for command: {}", e)))?;
        match written {
            Ok(()) => {}
            // The program may exit without reading its input
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Err(e) => return Err(ProviderError::Failed(format!("failed to write stdin: {}", e))),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(ProviderError::Failed(format!(
                "command exited with {}: {}",
                code,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| ProviderError::MalformedResponse(format!("stdout is not UTF-8: {}", e)))?;
        Ok(stdout.trim().to_string())
    }

    fn name(&self) -> &str {
        "command"
    }
}
