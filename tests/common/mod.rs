// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Catalog builders, canned workflows and a scriptable recording provider

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::fs;
use tokio::time::Instant;

use conductor::engine::{RunnerConfig, WorkflowRunner};
use conductor::provider::{CapabilityProvider, CapabilityRequest, ProviderError, Result};
use conductor::registry::{Agent, AgentRegistry, TaskDefinition, WorkflowCatalog, WorkflowTemplate};

/// One provider invocation as seen by the recording provider
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub task_id: String,
    pub agent_id: String,
    pub role: String,
    pub context: String,
    pub started: Instant,
    pub finished: Instant,
}

/// Provider that echoes its context, with per-task failures, delays and panics
#[derive(Default)]
pub struct ScriptedProvider {
    failures: HashMap<String, ProviderError>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    panics: HashSet<String>,
    replies: HashMap<String, String>,
    calls: Arc<Mutex<Vec<CallRecord>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, task_id: &str, error: ProviderError) -> Self {
        self.failures.insert(task_id.to_string(), error);
        self
    }

    pub fn delay_on(mut self, task_id: &str, delay: Duration) -> Self {
        self.delays.insert(task_id.to_string(), delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    pub fn panic_on(mut self, task_id: &str) -> Self {
        self.panics.insert(task_id.to_string());
        self
    }

    pub fn reply_on(mut self, task_id: &str, reply: &str) -> Self {
        self.replies.insert(task_id.to_string(), reply.to_string());
        self
    }

    /// Shared handle to the call log, usable after the provider moves into a runner
    pub fn calls(&self) -> Arc<Mutex<Vec<CallRecord>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl CapabilityProvider for ScriptedProvider {
    async fn execute(&self, request: &CapabilityRequest) -> Result<String> {
        let started = Instant::now();

        let delay = self
            .delays
            .get(&request.task_id)
            .copied()
            .or(self.default_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.panics.contains(&request.task_id) {
            panic!("scripted panic in task {}", request.task_id);
        }

        self.calls.lock().unwrap().push(CallRecord {
            task_id: request.task_id.clone(),
            agent_id: request.agent_id.clone(),
            role: request.role.clone(),
            context: request.context.clone(),
            started,
            finished: Instant::now(),
        });

        if let Some(error) = self.failures.get(&request.task_id) {
            return Err(error.clone());
        }

        Ok(self
            .replies
            .get(&request.task_id)
            .cloned()
            .unwrap_or_else(|| request.context.clone()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn echo_agents() -> AgentRegistry {
    let mut agents = AgentRegistry::new();
    agents.register(
        Agent::new("echo", "Echo", "Repeats its input").with_capability("testing"),
    );
    agents.register(
        Agent::new("writer", "Writer", "Technical writer").with_capability("writing"),
    );
    agents
}

/// W1: A, then B and C both depending on A
pub fn fan_out_workflow() -> WorkflowTemplate {
    WorkflowTemplate::new("w1", "Fan-out")
        .with_task(TaskDefinition::new("A", "echo"))
        .with_task(TaskDefinition::new("B", "echo").depends_on("A"))
        .with_task(TaskDefinition::new("C", "echo").depends_on("A"))
}

/// W2: A and B depending on each other
pub fn cyclic_workflow() -> WorkflowTemplate {
    WorkflowTemplate::new("w2", "Cycle")
        .with_task(TaskDefinition::new("A", "echo").depends_on("B"))
        .with_task(TaskDefinition::new("B", "echo").depends_on("A"))
}

/// W3: two independent single-task chains
pub fn independent_workflow() -> WorkflowTemplate {
    WorkflowTemplate::new("w3", "Independent")
        .with_task(TaskDefinition::new("A", "echo"))
        .with_task(TaskDefinition::new("B", "echo"))
}

/// Linear chain t1 -> t2 -> ... -> tn
pub fn chain_workflow(id: &str, length: usize) -> WorkflowTemplate {
    let mut template = WorkflowTemplate::new(id, "Chain");
    for i in 1..=length {
        let mut task = TaskDefinition::new(format!("t{}", i), "echo");
        if i > 1 {
            task = task.depends_on(format!("t{}", i - 1));
        }
        template = template.with_task(task);
    }
    template
}

/// Lenient catalog holding the given templates
pub fn catalog_with(templates: Vec<WorkflowTemplate>) -> WorkflowCatalog {
    let mut catalog = WorkflowCatalog::new();
    for template in templates {
        catalog.register(template).unwrap();
    }
    catalog
}

pub fn runner_for(
    templates: Vec<WorkflowTemplate>,
    provider: Arc<dyn CapabilityProvider>,
) -> WorkflowRunner {
    WorkflowRunner::new(
        Arc::new(echo_agents()),
        Arc::new(catalog_with(templates)),
        provider,
    )
}

pub fn runner_with_config(
    templates: Vec<WorkflowTemplate>,
    provider: Arc<dyn CapabilityProvider>,
    config: RunnerConfig,
) -> WorkflowRunner {
    runner_for(templates, provider).with_config(config)
}

pub const SAMPLE_CATALOG: &str = r#"
agents:
  - id: echo
    name: Echo
    role: "Repeats its input"
    capabilities: [testing]
  - id: writer
    name: Writer
    role: "Technical writer"
    capabilities: [writing, review]
workflows:
  - id: w1
    name: Fan-out
    description: One seed task feeding two followers
    entry: A
    tasks:
      - id: A
        description: Seed task
        agent: echo
      - id: B
        agent: echo
        depends_on: [A]
      - id: C
        agent: writer
        depends_on: [A]
  - id: w2
    name: Cycle
    tasks:
      - id: A
        agent: echo
        depends_on: [B]
      - id: B
        agent: echo
        depends_on: [A]
"#;

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub async fn create_catalog_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(format!("{}.yaml", name));
        fs::write(&path, content).await.unwrap();
        path
    }
}

pub async fn read_json_output(path: &Path) -> serde_json::Value {
    let content = fs::read_to_string(path).await.unwrap();
    serde_json::from_str(&content).unwrap()
}
