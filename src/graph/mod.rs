use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::task::LayoutPin;

/// Engine-side view of one task.
///
/// Timing, level and position fields are scratch state: every analysis run builds a
/// fresh node map and fills them from scratch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub weight: f64,
    /// Names this node requires, empty and dangling entries removed.
    pub dependencies: IndexSet<String>,
    /// Names that require this node.
    pub dependents: IndexSet<String>,
    /// Dependency names that matched no node. Kept for diagnostics only.
    pub dangling: Vec<String>,
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    pub buffer: f64,
    pub level: usize,
    pub tree_index: usize,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<LayoutPin>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weight,
            dependencies: IndexSet::new(),
            dependents: IndexSet::new(),
            dangling: Vec::new(),
            earliest_start: 0.0,
            earliest_finish: 0.0,
            latest_start: 0.0,
            latest_finish: 0.0,
            buffer: 0.0,
            level: 0,
            tree_index: 0,
            x: 0.0,
            y: 0.0,
            pin: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.dependents.is_empty()
    }
}

/// Name-keyed node map. Iteration order is the insertion order of the input tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskGraph {
    nodes: IndexMap<String, GraphNode>,
    duplicate_names: Vec<String>,
}

impl TaskGraph {
    pub(crate) fn from_parts(
        nodes: IndexMap<String, GraphNode>,
        duplicate_names: Vec<String>,
    ) -> Self {
        Self {
            nodes,
            duplicate_names,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut GraphNode> {
        self.nodes.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Position of `name` in insertion order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.nodes.get_index_of(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> {
        self.nodes.values_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|name| name.as_str())
    }

    pub fn node_by_id(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.values().find(|node| node.id == id)
    }

    /// Names that occurred more than once in the input; the last occurrence won.
    pub fn duplicate_names(&self) -> &[String] {
        &self.duplicate_names
    }

    /// `(task, missing dependency)` pairs dropped while building.
    pub fn dangling_references(&self) -> Vec<(String, String)> {
        self.nodes
            .values()
            .flat_map(|node| {
                node.dangling
                    .iter()
                    .map(move |dep| (node.name.clone(), dep.clone()))
            })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.dependencies.len()).sum()
    }

    pub fn into_nodes(self) -> Vec<GraphNode> {
        self.nodes.into_values().collect()
    }
}

pub mod builder;
pub mod task_dag;

pub use builder::GraphBuilder;
pub use task_dag::TaskDag;
