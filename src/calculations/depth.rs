use crate::graph::{GraphNode, TaskGraph};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthReport {
    /// Longest dependency chain ending at each node, in insertion order.
    pub depths: IndexMap<String, usize>,
    /// Nodes found on a loop during the walk. They contribute depth zero.
    pub cycle_nodes: Vec<String>,
}

impl DepthReport {
    pub fn depth(&self, name: &str) -> Option<usize> {
        self.depths.get(name).copied()
    }

    pub fn max_depth(&self) -> usize {
        self.depths.values().copied().max().unwrap_or(0)
    }
}

/// Memo table for depth queries.
///
/// Owned by the caller and passed in explicitly, so separate projects never share a
/// cache. Any structural edit clears the whole table; graphs are small enough that
/// targeted invalidation is not worth tracking.
#[derive(Debug, Default)]
pub struct DepthContext {
    cache: HashMap<String, usize>,
    cycle_nodes: IndexSet<String>,
}

impl DepthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, name: &str) -> Option<usize> {
        self.cache.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
        self.cycle_nodes.clear();
    }

    pub fn on_dependency_changed(&mut self, name: &str) {
        debug!(task = name, "dependency changed, clearing depth cache");
        self.invalidate_all();
    }

    pub fn on_node_removed(&mut self, name: &str) {
        debug!(task = name, "task removed, clearing depth cache");
        self.invalidate_all();
    }

    /// Depth of one node, or `None` when `name` is not in `graph`.
    pub fn depth_of(&mut self, graph: &TaskGraph, name: &str) -> Option<usize> {
        if !graph.contains(name) {
            return None;
        }
        Some(self.visit(graph, name))
    }

    pub fn compute_all(&mut self, graph: &TaskGraph) -> DepthReport {
        let mut depths = IndexMap::with_capacity(graph.len());
        for name in graph.names() {
            if let Some(depth) = self.depth_of(graph, name) {
                depths.insert(name.to_string(), depth);
            }
        }
        if !self.cycle_nodes.is_empty() {
            warn!(cycle = ?self.cycle_nodes, "depth computed with cycle guard");
        }

        // Report cycle members in insertion order
        let mut cycle_nodes: Vec<String> = self.cycle_nodes.iter().cloned().collect();
        cycle_nodes.sort_by_key(|name| graph.index_of(name));

        DepthReport {
            depths,
            cycle_nodes,
        }
    }

    fn visit(&mut self, graph: &TaskGraph, start: &str) -> usize {
        if let Some(&depth) = self.cache.get(start) {
            return depth;
        }
        let Some(node) = graph.get(start) else {
            return 0;
        };

        let mut frames: Vec<Frame<'_>> = vec![Frame::new(node)];
        let mut visiting: HashSet<&str> = HashSet::from([node.name.as_str()]);
        while let Some(frame) = frames.last_mut() {
            let Some(dep) = frame.dependencies.next() else {
                let Some(done) = frames.pop() else {
                    break;
                };
                visiting.remove(done.name);
                self.cache.insert(done.name.to_string(), done.depth);
                if let Some(parent) = frames.last_mut() {
                    parent.depth = parent.depth.max(done.depth + 1);
                }
                continue;
            };

            if let Some(&depth) = self.cache.get(dep.as_str()) {
                frame.depth = frame.depth.max(depth + 1);
            } else if visiting.contains(dep.as_str()) {
                // Cycle detection - everything from the first sighting up is on the loop
                frame.depth = frame.depth.max(1);
                if let Some(pos) = frames.iter().position(|entry| entry.name == dep.as_str()) {
                    for member in &frames[pos..] {
                        self.cycle_nodes.insert(member.name.to_string());
                    }
                }
            } else if let Some(dep_node) = graph.get(dep) {
                visiting.insert(dep_node.name.as_str());
                frames.push(Frame::new(dep_node));
            } else {
                frame.depth = frame.depth.max(1);
            }
        }
        self.cache.get(start).copied().unwrap_or(0)
    }
}

/// One node on the explicit DFS stack.
struct Frame<'g> {
    name: &'g str,
    dependencies: indexmap::set::Iter<'g, String>,
    /// Longest chain found through the dependencies visited so far.
    depth: usize,
}

impl<'g> Frame<'g> {
    fn new(node: &'g GraphNode) -> Self {
        Self {
            name: node.name.as_str(),
            dependencies: node.dependencies.iter(),
            depth: 0,
        }
    }
}

/// Depths for every node with a throwaway context.
pub fn compute_depths(graph: &TaskGraph) -> DepthReport {
    DepthContext::new().compute_all(graph)
}

/// Would making `to` depend on `from` close a loop?
///
/// True when `from == to` or when `to` already reaches `from` through dependents, i.e.
/// `from` already depends on `to` transitively. Unknown names never create a cycle.
pub fn would_create_cycle(graph: &TaskGraph, from: &str, to: &str) -> bool {
    if from == to {
        return graph.contains(from);
    }
    if !graph.contains(from) || !graph.contains(to) {
        return false;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![to];
    while let Some(current) = stack.pop() {
        if current == from {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        if let Some(node) = graph.get(current) {
            stack.extend(node.dependents.iter().map(|name| name.as_str()));
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::task::Task;

    fn chain() -> TaskGraph {
        GraphBuilder::from_tasks(&[
            Task::new("a", 5.0),
            Task::new("b", 1.0).with_depends(["a"]),
            Task::new("c", 1.0).with_depends(["b", "a"]),
            Task::new("lone", 9.0),
        ])
        .build()
    }

    #[test]
    fn depth_is_chain_length_not_weight() {
        let report = compute_depths(&chain());
        assert_eq!(report.depth("a"), Some(0));
        assert_eq!(report.depth("b"), Some(1));
        assert_eq!(report.depth("c"), Some(2));
        assert_eq!(report.depth("lone"), Some(0));
        assert_eq!(report.max_depth(), 2);
        assert!(report.cycle_nodes.is_empty());
    }

    #[test]
    fn context_caches_until_invalidated() {
        let graph = chain();
        let mut ctx = DepthContext::new();
        assert_eq!(ctx.depth_of(&graph, "c"), Some(2));
        assert_eq!(ctx.cached("b"), Some(1));
        ctx.on_dependency_changed("b");
        assert!(ctx.is_empty());
        assert_eq!(ctx.depth_of(&graph, "missing"), None);
    }

    #[test]
    fn cycle_members_are_recorded() {
        let graph = GraphBuilder::from_tasks(&[
            Task::new("x", 1.0).with_depends(["y"]),
            Task::new("y", 1.0).with_depends(["x"]),
            Task::new("z", 1.0).with_depends(["y"]),
        ])
        .build();
        let report = compute_depths(&graph);
        assert_eq!(report.cycle_nodes, vec!["x", "y"]);
        assert_eq!(report.depth("x"), Some(2));
        assert_eq!(report.depth("y"), Some(1));
        assert_eq!(report.depth("z"), Some(2));
    }

    #[test]
    fn reachability_guard() {
        let graph = chain();
        // c already depends on a, so a depending on c would loop
        assert!(would_create_cycle(&graph, "c", "a"));
        assert!(!would_create_cycle(&graph, "a", "c"));
        assert!(!would_create_cycle(&graph, "lone", "c"));
        assert!(would_create_cycle(&graph, "b", "b"));
        assert!(!would_create_cycle(&graph, "ghost", "a"));
    }
}
