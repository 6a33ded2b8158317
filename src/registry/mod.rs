// ABOUTME: Registry module holding agents and workflow templates
// ABOUTME: Pure lookup tables owned by the host process, plus validation and catalog loading

pub mod agent;
pub mod error;
pub mod loader;
pub mod validation;
pub mod workflow;

pub use agent::{Agent, AgentRegistry};
pub use error::{RegistryError, Result};
pub use loader::CatalogFile;
pub use validation::{ValidationReport, WorkflowValidator};
pub use workflow::{TaskDefinition, WorkflowCatalog, WorkflowTemplate};
