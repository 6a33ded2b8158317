// ABOUTME: YAML catalog file parsing for agents and workflow templates
// ABOUTME: Turns the static startup data into populated registries

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::info;

use super::agent::{Agent, AgentRegistry};
use super::error::Result;
use super::workflow::{WorkflowCatalog, WorkflowTemplate};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub workflows: Vec<WorkflowTemplate>,
}

impl CatalogFile {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).await?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Register everything into fresh registries, in file order
    pub fn into_registries(self, strict: bool) -> Result<(AgentRegistry, WorkflowCatalog)> {
        let mut agents = AgentRegistry::new();
        for agent in self.agents {
            agents.register(agent);
        }

        let mut catalog = WorkflowCatalog::new().with_strict_mode(strict);
        for template in self.workflows {
            catalog.register(template)?;
        }

        info!(
            "Loaded catalog: {} agents, {} workflows",
            agents.len(),
            catalog.len()
        );
        Ok((agents, catalog))
    }
}
