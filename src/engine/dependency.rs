// ABOUTME: Dependency graph over a workflow template's tasks
// ABOUTME: Provides cycle detection, round planning and ancestor queries used by validation and reporting

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::{Direction, Graph};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::registry::{RegistryError, WorkflowTemplate};

pub struct DependencyGraph {
    workflow_id: String,
    graph: Graph<String, ()>,
    task_indices: HashMap<String, NodeIndex>,
    dangling: Vec<(String, String)>,
}

/// Predicted rounds for an acyclic template: batch `n` holds the tasks that
/// become ready in round `n + 1` when every task succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub batches: Vec<Vec<String>>,
    pub total_tasks: usize,
}

impl DependencyGraph {
    /// Build the graph from a template.
    ///
    /// Dependencies naming tasks outside the template do not become edges; they
    /// are recorded and reported by `dangling_dependencies`.
    pub fn from_template(template: &WorkflowTemplate) -> Self {
        let mut graph = Graph::new();
        let mut task_indices = HashMap::new();
        let mut dangling = Vec::new();

        for task in &template.tasks {
            task_indices
                .entry(task.id.clone())
                .or_insert_with(|| graph.add_node(task.id.clone()));
        }

        // Edges run dependency -> dependent
        for task in &template.tasks {
            let task_node = task_indices[&task.id];
            for dependency in &task.depends_on {
                match task_indices.get(dependency) {
                    Some(&dep_node) => {
                        graph.update_edge(dep_node, task_node, ());
                    }
                    None => dangling.push((task.id.clone(), dependency.clone())),
                }
            }
        }

        Self {
            workflow_id: template.id.clone(),
            graph,
            task_indices,
            dangling,
        }
    }

    /// `(task, dependency)` pairs whose dependency names no task in the template
    pub fn dangling_dependencies(&self) -> &[(String, String)] {
        &self.dangling
    }

    /// Every group of tasks that participates in a cycle, self-loops included
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self
                        .graph
                        .contains_edge(component[0], component[0])
            })
            .map(|mut component| {
                component.sort();
                component
                    .into_iter()
                    .map(|node| self.graph[node].clone())
                    .collect()
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Group tasks into the rounds they would run in if every task succeeds
    pub fn create_execution_plan(&self) -> Result<ExecutionPlan, RegistryError> {
        if let Some((task, dependency)) = self.dangling.first() {
            return Err(RegistryError::UnknownDependency {
                workflow_id: self.workflow_id.clone(),
                task: task.clone(),
                dependency: dependency.clone(),
            });
        }

        if let Some(cycle) = self.find_cycles().into_iter().next() {
            return Err(RegistryError::CyclicDependency {
                workflow_id: self.workflow_id.clone(),
                tasks: cycle,
            });
        }

        Ok(ExecutionPlan {
            batches: self.create_execution_batches(),
            total_tasks: self.task_indices.len(),
        })
    }

    fn create_execution_batches(&self) -> Vec<Vec<String>> {
        let mut batches = Vec::new();
        let mut completed: HashSet<NodeIndex> = HashSet::new();
        // Node indices follow template order, so batches are deterministic
        let mut remaining: Vec<NodeIndex> = self.graph.node_indices().collect();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<NodeIndex>, Vec<NodeIndex>) =
                remaining.into_iter().partition(|&node| {
                    self.graph
                        .neighbors_directed(node, Direction::Incoming)
                        .all(|dep| completed.contains(&dep))
                });

            if ready.is_empty() {
                break;
            }

            completed.extend(ready.iter().copied());
            batches.push(ready.into_iter().map(|n| self.graph[n].clone()).collect());
            remaining = blocked;
        }

        batches
    }

    /// Every task reachable from `task_id` by following dependency edges backwards
    pub fn get_transitive_dependencies(&self, task_id: &str) -> Vec<String> {
        let Some(&start) = self.task_indices.get(task_id) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors_directed(current, Direction::Incoming) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        // The start node only appears when it sits on a cycle through itself
        let mut ids: Vec<String> = visited
            .into_iter()
            .filter(|&node| node != start)
            .map(|node| self.graph[node].clone())
            .collect();
        ids.sort();
        ids
    }
}

impl ExecutionPlan {
    /// Largest number of tasks dispatched in a single round
    pub fn max_parallelism(&self) -> usize {
        self.batches.iter().map(|batch| batch.len()).max().unwrap_or(0)
    }

    /// Number of rounds, equal to the longest dependency chain length
    pub fn execution_depth(&self) -> usize {
        self.batches.len()
    }
}
