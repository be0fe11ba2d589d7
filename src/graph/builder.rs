use super::{GraphNode, TaskGraph};
use crate::task::Task;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use tracing::debug;

/// Turns a flat task list into a [`TaskGraph`].
///
/// Tolerates dangling dependency names and duplicate task names: dangling names are
/// moved to [`GraphNode::dangling`], duplicates overwrite earlier entries in place.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: IndexMap<String, GraphNode>,
    duplicate_names: Vec<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded with `task-<index>` ids.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut builder = Self::new();
        for (idx, task) in tasks.iter().enumerate() {
            builder.add_task(format!("task-{idx}"), task);
        }
        builder
    }

    pub fn add_task(&mut self, id: impl Into<String>, task: &Task) -> &mut Self {
        let mut node = GraphNode::new(id, task.name.clone(), task.difficulty);
        node.dependencies = task
            .dependency_names()
            .map(ToOwned::to_owned)
            .collect::<IndexSet<_>>();
        node.pin = task.layout_pin();

        if self.nodes.insert(task.name.clone(), node).is_some() {
            debug!(name = %task.name, "duplicate task name, later entry replaces earlier one");
            if !self.duplicate_names.contains(&task.name) {
                self.duplicate_names.push(task.name.clone());
            }
        }
        self
    }

    pub fn build(self) -> TaskGraph {
        let Self {
            mut nodes,
            duplicate_names,
        } = self;

        let known: HashSet<String> = nodes.keys().cloned().collect();

        // Step 1: move dangling names out of the dependency sets
        for node in nodes.values_mut() {
            let (present, missing): (IndexSet<String>, IndexSet<String>) = node
                .dependencies
                .drain(..)
                .partition(|dep| known.contains(dep));
            node.dependencies = present;
            for dep in missing {
                debug!(task = %node.name, dependency = %dep, "dependency names no task, ignoring");
                node.dangling.push(dep);
            }
        }

        // Step 2: invert dependencies into dependents
        let edges: Vec<(String, String)> = nodes
            .values()
            .flat_map(|node| {
                node.dependencies
                    .iter()
                    .map(move |dep| (dep.clone(), node.name.clone()))
            })
            .collect();
        for (dep, dependent) in edges {
            if let Some(node) = nodes.get_mut(&dep) {
                node.dependents.insert(dependent);
            }
        }

        debug!(nodes = nodes.len(), "task graph built");
        TaskGraph::from_parts(nodes, duplicate_names)
    }
}
