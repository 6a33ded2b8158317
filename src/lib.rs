// ABOUTME: Main library module for the conductor workflow runner
// ABOUTME: Exports agent and workflow registries, providers, the round-based engine and report output

pub mod cli;
pub mod engine;
pub mod output;
pub mod provider;
pub mod registry;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use engine::{
    RunError, RunStatus, RunnerConfig, TaskInput, TaskStatus, Termination, WorkflowRunReport,
    WorkflowRunner,
};
pub use output::{OutputFormat, OutputHandler};
pub use provider::{CapabilityProvider, CapabilityRequest, ProviderError};
pub use registry::{
    Agent, AgentRegistry, RegistryError, TaskDefinition, WorkflowCatalog, WorkflowTemplate,
};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
