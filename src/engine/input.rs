// ABOUTME: Task input assembly and rendering into provider context text
// ABOUTME: Merges a task's seed value with the stored outputs of its declared dependencies

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input a task receives at dispatch time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    /// Caller-supplied value for seeded tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Value>,
    /// Outputs of the declared dependencies keyed by dependency id, in declared order
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
}

impl TaskInput {
    pub fn seeded(value: Value) -> Self {
        Self {
            seed: Some(value).filter(|v| !v.is_null()),
            dependencies: IndexMap::new(),
        }
    }

    /// Collect the outputs of `dependencies` from `results`.
    ///
    /// Only ids listed in `dependencies` are looked up, so outputs of unrelated
    /// tasks never leak into the input.
    pub fn assemble(
        seed: Option<Value>,
        dependencies: &[String],
        results: &IndexMap<String, String>,
    ) -> Self {
        let mut collected = IndexMap::new();
        for dependency in dependencies {
            if let Some(output) = results.get(dependency) {
                collected
                    .entry(dependency.clone())
                    .or_insert_with(|| output.clone());
            }
        }

        Self {
            seed: seed.filter(|v| !v.is_null()),
            dependencies: collected,
        }
    }

    /// Render the text context handed to the provider.
    ///
    /// A lone seed or a lone dependency output passes through verbatim. With
    /// neither, the task description is used. Anything else becomes labelled
    /// sections in declared order.
    pub fn render(&self, description: &str) -> String {
        let seed = self.seed.as_ref().map(value_to_text);

        match (seed, self.dependencies.len()) {
            (Some(seed), 0) => seed,
            (None, 0) => description.to_string(),
            (None, 1) => self
                .dependencies
                .values()
                .next()
                .cloned()
                .unwrap_or_default(),
            (seed, _) => {
                let mut sections = Vec::with_capacity(self.dependencies.len() + 1);
                if let Some(seed) = seed {
                    sections.push(format!("## input\n{}", seed));
                }
                for (dependency, output) in &self.dependencies {
                    sections.push(format!("## {}\n{}", dependency, output));
                }
                sections.join("\n\n")
            }
        }
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
