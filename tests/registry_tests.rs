// ABOUTME: Integration tests for agent and workflow registries and catalog files
// ABOUTME: Tests lookup integrity, strict registration and running workflows loaded from YAML

use serde_json::json;
use std::sync::Arc;

use conductor::engine::{RunStatus, WorkflowRunner};
use conductor::provider::EchoProvider;
use conductor::registry::{
    Agent, AgentRegistry, CatalogFile, RegistryError, TaskDefinition, WorkflowCatalog,
    WorkflowTemplate,
};

mod common;
use common::{TestEnvironment, SAMPLE_CATALOG};

#[test]
fn test_get_after_register_returns_registered_value() {
    let mut agents = AgentRegistry::new();
    let agent = Agent::new("critic", "Critic", "Finds weaknesses")
        .with_capability("review")
        .with_capability("writing");
    agents.register(agent.clone());

    assert_eq!(agents.get("critic").unwrap(), &agent);

    let mut catalog = WorkflowCatalog::new();
    let template = WorkflowTemplate::new("review", "Review")
        .with_description("Draft then critique")
        .with_task(TaskDefinition::new("draft", "critic").with_description("Write it"))
        .with_task(TaskDefinition::new("critique", "critic").depends_on("draft"));
    catalog.register(template.clone()).unwrap();

    assert_eq!(catalog.get("review").unwrap(), &template);
}

#[test]
fn test_unregistered_ids_are_not_found() {
    let agents = AgentRegistry::new();
    let catalog = WorkflowCatalog::new();

    let agent_err = agents.get("nobody").unwrap_err();
    assert!(matches!(
        agent_err,
        RegistryError::AgentNotFound { ref agent_id } if agent_id == "nobody"
    ));
    assert!(agent_err.is_not_found());

    let workflow_err = catalog.get("nothing").unwrap_err();
    assert!(workflow_err.is_not_found());
    assert!(matches!(workflow_err, RegistryError::WorkflowNotFound { .. }));
}

#[test]
fn test_strict_registration_rejects_structural_defects() {
    let mut catalog = WorkflowCatalog::new().with_strict_mode(true);

    let dangling = WorkflowTemplate::new("dangling", "Dangling")
        .with_task(TaskDefinition::new("a", "echo").depends_on("ghost"));
    assert!(matches!(
        catalog.register(dangling).unwrap_err(),
        RegistryError::UnknownDependency { .. }
    ));

    let duplicate = WorkflowTemplate::new("dupes", "Dupes")
        .with_task(TaskDefinition::new("a", "echo"))
        .with_task(TaskDefinition::new("a", "echo"));
    assert!(matches!(
        catalog.register(duplicate).unwrap_err(),
        RegistryError::DuplicateTask { .. }
    ));

    let empty = WorkflowTemplate::new("empty", "Empty");
    assert!(matches!(
        catalog.register(empty).unwrap_err(),
        RegistryError::EmptyWorkflow { .. }
    ));

    let bad_entry = WorkflowTemplate::new("entry", "Entry")
        .with_entry("missing")
        .with_task(TaskDefinition::new("a", "echo"));
    assert!(matches!(
        catalog.register(bad_entry).unwrap_err(),
        RegistryError::UnknownEntryTask { .. }
    ));

    assert!(catalog.is_empty());
}

#[tokio::test]
async fn test_catalog_file_loading() {
    let env = TestEnvironment::new();
    let path = env.create_catalog_file("catalog", SAMPLE_CATALOG).await;

    let file = CatalogFile::from_file(&path).await.unwrap();
    assert_eq!(file.agents.len(), 2);
    assert_eq!(file.workflows.len(), 2);

    let (agents, catalog) = file.into_registries(false).unwrap();
    let writers: Vec<&str> = agents
        .find_by_capability("writing")
        .map(|a| a.id.as_str())
        .collect();
    assert_eq!(writers, vec!["writer"]);

    let w1 = catalog.get("w1").unwrap();
    assert_eq!(w1.entry_task(), Some("A"));
    assert_eq!(w1.get_task("C").unwrap().agent_id, "writer");
    assert_eq!(w1.get_task("B").unwrap().depends_on, vec!["A"]);
    assert_eq!(
        catalog.list().map(|t| t.id.as_str()).collect::<Vec<_>>(),
        vec!["w1", "w2"]
    );
}

#[tokio::test]
async fn test_strict_catalog_file_rejects_cycle() {
    let env = TestEnvironment::new();
    let path = env.create_catalog_file("catalog", SAMPLE_CATALOG).await;

    let err = CatalogFile::from_file(&path)
        .await
        .unwrap()
        .into_registries(true)
        .unwrap_err();

    assert!(matches!(err, RegistryError::CyclicDependency { .. }));
}

#[tokio::test]
async fn test_missing_catalog_file() {
    let env = TestEnvironment::new();
    let err = CatalogFile::from_file(env.path().join("absent.yaml"))
        .await
        .unwrap_err();
    match &err {
        RegistryError::Io(source) => assert_eq!(source.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected an io error, got {:?}", other),
    }
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_loaded_catalog_runs_end_to_end() {
    let (agents, catalog) = CatalogFile::from_yaml(SAMPLE_CATALOG)
        .unwrap()
        .into_registries(false)
        .unwrap();
    let runner = WorkflowRunner::new(
        Arc::new(agents),
        Arc::new(catalog),
        Arc::new(EchoProvider::new()),
    );

    let report = runner.run("w1", json!("x")).await.unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.workflow_name, "Fan-out");
    assert_eq!(report.results["C"], "x");

    let cycle = runner.run("w2", json!("x")).await.unwrap();
    assert_eq!(cycle.status, RunStatus::Failed);
    assert_eq!(cycle.rounds, 0);
}
