use super::TaskGraph;
use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// petgraph view of a [`TaskGraph`], edges pointing from dependency to dependent.
pub struct TaskDag {
    pub graph: DiGraph<String, ()>,
    pub name_to_index: HashMap<String, NodeIndex>,
}

impl TaskDag {
    pub fn build(graph: &TaskGraph) -> Self {
        let mut dag: DiGraph<String, ()> = DiGraph::with_capacity(graph.len(), graph.edge_count());
        let mut name_to_index: HashMap<String, NodeIndex> = HashMap::with_capacity(graph.len());

        // Add nodes first
        for name in graph.names() {
            let node_ix = dag.add_node(name.to_string());
            name_to_index.insert(name.to_string(), node_ix);
        }

        // Add edges: dependency -> dependent
        for node in graph.nodes() {
            for dep in &node.dependencies {
                if let (Some(&u), Some(&v)) =
                    (name_to_index.get(dep), name_to_index.get(&node.name))
                {
                    dag.add_edge(u, v, ());
                }
            }
        }

        Self {
            graph: dag,
            name_to_index,
        }
    }

    pub fn has_cycle(&self) -> bool {
        toposort(&self.graph, None).is_err()
    }

    /// Groups of names that sit on an actual loop: strongly connected components with
    /// more than one member, or a single member depending on itself.
    ///
    /// Members are listed in insertion order and groups are ordered by their first member.
    pub fn cycle_groups(&self) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<NodeIndex>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&ix| self.graph.contains_edge(ix, ix))
            })
            .collect();

        for group in &mut groups {
            group.sort_unstable();
        }
        groups.sort_by_key(|group| group.first().copied());

        groups
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|ix| self.graph[ix].clone())
                    .collect()
            })
            .collect()
    }
}
