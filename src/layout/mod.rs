use crate::config::{GridConfig, LayoutConfig};
use crate::graph::TaskGraph;
use serde::Serialize;
use tracing::debug;

/// How a tree got its entry point. Carries the node id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "nodeId", rename_all = "camelCase")]
pub enum TreeRoot {
    /// A node with no dependencies.
    Rooted(String),
    /// A node picked to break a cycle; its dependencies were ignored for layout.
    SyntheticRoot(String),
}

impl TreeRoot {
    pub fn node_id(&self) -> &str {
        match self {
            TreeRoot::Rooted(id) | TreeRoot::SyntheticRoot(id) => id,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, TreeRoot::SyntheticRoot(_))
    }
}

/// One visual cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutTree {
    pub index: usize,
    pub roots: Vec<TreeRoot>,
    /// Member names in insertion order.
    pub members: Vec<String>,
}

impl LayoutTree {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            roots: Vec::new(),
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutResult {
    pub trees: Vec<LayoutTree>,
    pub canvas: Canvas,
}

impl LayoutResult {
    pub fn synthetic_roots(&self) -> impl Iterator<Item = &TreeRoot> {
        self.trees
            .iter()
            .flat_map(|tree| tree.roots.iter())
            .filter(|root| root.is_synthetic())
    }
}

/// Assigns `level`, `tree_index`, `x` and `y` on every node of a graph.
///
/// A pinned node keeps its level and tree but is left out of column stacking; its pixel
/// position is the top-left corner of its pinned grid cell.
pub struct LayoutEngine<'a> {
    config: &'a LayoutConfig,
    grid: &'a GridConfig,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(config: &'a LayoutConfig, grid: &'a GridConfig) -> Self {
        Self { config, grid }
    }

    pub fn execute(&self, graph: &mut TaskGraph) -> LayoutResult {
        if graph.is_empty() {
            return LayoutResult::default();
        }

        let assignment = levels::assign_levels(graph);
        let (positions, canvas) = position::position_trees(
            graph,
            &assignment.trees,
            &assignment.levels,
            self.config,
            self.grid,
        );

        for node in graph.nodes_mut() {
            node.level = assignment.level(&node.name).unwrap_or(0);
            node.tree_index = assignment.tree(&node.name).unwrap_or(0);
            if let Some(&(x, y)) = positions.get(&node.name) {
                node.x = x;
                node.y = y;
            }
        }

        debug!(
            trees = assignment.trees.len(),
            width = canvas.width,
            height = canvas.height,
            "layout complete"
        );
        LayoutResult {
            trees: assignment.trees,
            canvas,
        }
    }
}

pub mod grid;
pub mod levels;
pub mod position;

pub use grid::{GridItem, cell_to_pixel, pin_to_cell, pixel_to_cell, resolve_overlaps, to_grid};
pub use levels::{LevelAssignment, assign_levels};
