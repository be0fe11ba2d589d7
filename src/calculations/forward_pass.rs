use super::topo::TopoOrder;
use crate::graph::TaskGraph;
use tracing::debug;

/// Earliest start/finish over a (possibly partial) topological order.
pub struct ForwardPass<'a> {
    order: &'a TopoOrder,
}

impl<'a> ForwardPass<'a> {
    pub fn new(order: &'a TopoOrder) -> Self {
        Self { order }
    }

    /// Fills `earliest_start`/`earliest_finish` and returns the project finish.
    ///
    /// Nodes stuck on a cycle are visited after the ordered ones; a dependency that
    /// has not been visited yet contributes a finish of zero.
    pub fn execute(&self, graph: &mut TaskGraph) -> f64 {
        for node in graph.nodes_mut() {
            node.earliest_start = 0.0;
            node.earliest_finish = 0.0;
        }

        for name in self.order.extended_order() {
            let Some(node) = graph.get(name) else {
                continue;
            };
            // Early start is max of all dependency finishes
            let earliest_start = node
                .dependencies
                .iter()
                .filter_map(|dep| graph.get(dep))
                .map(|dep| dep.earliest_finish)
                .fold(0.0_f64, f64::max);

            if let Some(node) = graph.get_mut(name) {
                node.earliest_start = earliest_start;
                node.earliest_finish = earliest_start + node.weight;
            }
        }

        let project_finish = graph
            .nodes()
            .map(|node| node.earliest_finish)
            .fold(0.0_f64, f64::max);
        debug!(project_finish, "forward pass complete");
        project_finish
    }
}
