// ABOUTME: Agent definitions and the in-memory agent registry
// ABOUTME: Agents are named workers whose role text is handed to the capability provider

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use super::error::{RegistryError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    /// Free-text role description passed to the provider as execution context
    pub role: String,
    /// Descriptive capability tags, never used for dispatch
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
}

impl Agent {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            capabilities: BTreeSet::new(),
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Lookup table of agents keyed by id.
///
/// Registration order is preserved for `list`. Re-registering an id replaces
/// the stored agent in place (last write wins) and keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: IndexMap<String, Agent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an agent by id
    pub fn register(&mut self, agent: Agent) {
        if self.agents.contains_key(&agent.id) {
            debug!("Replacing registered agent: {}", agent.id);
        } else {
            debug!("Registering agent: {}", agent.id);
        }
        self.agents.insert(agent.id.clone(), agent);
    }

    pub fn get(&self, agent_id: &str) -> Result<&Agent> {
        self.agents
            .get(agent_id)
            .ok_or_else(|| RegistryError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.agents.contains_key(agent_id)
    }

    /// Registered agents in insertion order
    pub fn list(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents.values()
    }

    /// Agents carrying the given capability tag, in insertion order
    pub fn find_by_capability<'a>(&'a self, capability: &'a str) -> impl Iterator<Item = &'a Agent> + 'a {
        self.agents
            .values()
            .filter(move |agent| agent.has_capability(capability))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
