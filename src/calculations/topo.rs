use crate::graph::TaskGraph;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

/// Result of ordering a [`TaskGraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopoOrder {
    /// Names in dependency order. Complete unless `has_cycle`.
    pub order: Vec<String>,
    pub has_cycle: bool,
    /// Names that could not be ordered: nodes on a cycle or reachable only through one,
    /// in insertion order.
    pub cycle_nodes: Vec<String>,
}

impl TopoOrder {
    /// The ordered names followed by the stuck ones, so every node appears exactly once.
    pub fn extended_order(&self) -> impl Iterator<Item = &String> {
        self.order.iter().chain(self.cycle_nodes.iter())
    }
}

/// Kahn's algorithm with a FIFO queue seeded in insertion order.
pub struct TopologicalSorter<'a> {
    graph: &'a TaskGraph,
}

impl<'a> TopologicalSorter<'a> {
    pub fn new(graph: &'a TaskGraph) -> Self {
        Self { graph }
    }

    pub fn execute(&self) -> TopoOrder {
        let mut in_degree: HashMap<&str, usize> = self
            .graph
            .nodes()
            .map(|node| (node.name.as_str(), node.dependencies.len()))
            .collect();

        let mut queue: VecDeque<&str> = self
            .graph
            .nodes()
            .filter(|node| node.dependencies.is_empty())
            .map(|node| node.name.as_str())
            .collect();

        let mut order = Vec::with_capacity(self.graph.len());
        while let Some(name) = queue.pop_front() {
            order.push(name.to_string());
            let Some(node) = self.graph.get(name) else {
                continue;
            };
            for dependent in &node.dependents {
                if let Some(deg) = in_degree.get_mut(dependent.as_str()) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        queue.push_back(dependent.as_str());
                    }
                }
            }
        }

        let has_cycle = order.len() < self.graph.len();
        let cycle_nodes: Vec<String> = if has_cycle {
            self.graph
                .nodes()
                .filter(|node| in_degree.get(node.name.as_str()).copied().unwrap_or(0) > 0)
                .map(|node| node.name.clone())
                .collect()
        } else {
            Vec::new()
        };

        if has_cycle {
            warn!(stuck = cycle_nodes.len(), "dependency cycle detected, order is partial");
        } else {
            debug!(nodes = order.len(), "topological order complete");
        }

        TopoOrder {
            order,
            has_cycle,
            cycle_nodes,
        }
    }
}

pub fn topological_order(graph: &TaskGraph) -> TopoOrder {
    TopologicalSorter::new(graph).execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::task::Task;

    #[test]
    fn ties_follow_insertion_order() {
        let tasks = vec![
            Task::new("zeta", 1.0),
            Task::new("alpha", 1.0),
            Task::new("mid", 1.0).with_depends(["zeta", "alpha"]),
            Task::new("beta", 1.0),
        ];
        let graph = GraphBuilder::from_tasks(&tasks).build();
        let result = topological_order(&graph);
        assert!(!result.has_cycle);
        assert_eq!(result.order, vec!["zeta", "alpha", "beta", "mid"]);
    }

    #[test]
    fn empty_graph_orders_nothing() {
        let graph = GraphBuilder::new().build();
        let result = topological_order(&graph);
        assert!(result.order.is_empty());
        assert!(!result.has_cycle);
    }

    #[test]
    fn nodes_behind_a_cycle_are_stuck() {
        let tasks = vec![
            Task::new("root", 1.0),
            Task::new("a", 1.0).with_depends(["root", "b"]),
            Task::new("b", 1.0).with_depends(["a"]),
            Task::new("after", 1.0).with_depends(["b"]),
        ];
        let graph = GraphBuilder::from_tasks(&tasks).build();
        let result = topological_order(&graph);
        assert!(result.has_cycle);
        assert_eq!(result.order, vec!["root"]);
        assert_eq!(result.cycle_nodes, vec!["a", "b", "after"]);
        assert_eq!(result.extended_order().count(), 4);
    }
}
