use super::topo::TopoOrder;
use crate::graph::TaskGraph;
use std::collections::HashSet;

/// Latest start/finish and buffer over the reversed order.
pub struct BackwardPass<'a> {
    order: &'a TopoOrder,
}

impl<'a> BackwardPass<'a> {
    pub fn new(order: &'a TopoOrder) -> Self {
        Self { order }
    }

    /// Requires [`super::forward_pass::ForwardPass`] to have run on `graph`.
    pub fn execute(&self, graph: &mut TaskGraph, project_finish: f64) {
        let names: Vec<&String> = self.order.extended_order().collect();
        let mut visited: HashSet<&str> = HashSet::with_capacity(names.len());

        for name in names.into_iter().rev() {
            let Some(node) = graph.get(name) else {
                continue;
            };

            // Late finish is the tightest visited dependent's late start
            let latest_finish = node
                .dependents
                .iter()
                .filter(|dependent| visited.contains(dependent.as_str()))
                .filter_map(|dependent| graph.get(dependent))
                .map(|dependent| dependent.latest_start)
                .reduce(f64::min)
                .unwrap_or(project_finish);

            if let Some(node) = graph.get_mut(name) {
                node.latest_finish = latest_finish;
                node.latest_start = latest_finish - node.weight;
                node.buffer = node.latest_start - node.earliest_start;
            }
            visited.insert(name.as_str());
        }
    }
}
