// ABOUTME: Capability provider interface consumed by the workflow runner
// ABOUTME: Exports the provider trait, request type and built-in echo and command providers

pub mod command;
pub mod echo;
pub mod error;

use async_trait::async_trait;
use serde::Serialize;

pub use command::{CommandConfig, CommandProvider};
pub use echo::EchoProvider;
pub use error::{ProviderError, Result};

/// One unit of work handed to a provider.
///
/// `role` is the assigned agent's role text and `context` the rendered task
/// input. The remaining fields identify the task for logging and tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityRequest {
    pub run_id: String,
    pub task_id: String,
    pub agent_id: String,
    pub description: String,
    pub role: String,
    pub context: String,
}

/// Executes a task's work. Called at most once per task per run; the runner
/// never retries a failed call.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn execute(&self, request: &CapabilityRequest) -> Result<String>;

    fn name(&self) -> &str;
}
