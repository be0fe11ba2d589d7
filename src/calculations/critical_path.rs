use super::backward_pass::BackwardPass;
use super::forward_pass::ForwardPass;
use super::topo::{TopoOrder, topological_order};
use crate::config::CriticalPathConfig;
use crate::graph::{GraphNode, TaskGraph};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Slack below this magnitude counts as zero.
pub const CRITICAL_TOLERANCE: f64 = 1e-3;

/// One dependency hop on the critical path. `weight` is the predecessor's weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPathEdge {
    pub from_id: String,
    pub to_id: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPathResult {
    pub edges: Vec<CriticalPathEdge>,
    pub project_duration: f64,
    /// Zero-slack names in topological order.
    pub critical_task_names: Vec<String>,
    /// Timing is advisory only when set.
    pub has_cycle: bool,
    pub cycle_nodes: Vec<String>,
}

impl CriticalPathResult {
    /// Linear scan; build [`critical_set`](Self::critical_set) once for per-node lookups.
    pub fn is_critical(&self, name: &str) -> bool {
        self.critical_task_names.iter().any(|n| n == name)
    }

    pub fn critical_set(&self) -> HashSet<&str> {
        self.critical_task_names.iter().map(String::as_str).collect()
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("duration={}", self.project_duration));
        parts.push(format!("critical={}", self.critical_task_names.len()));
        if self.has_cycle {
            parts.push(format!("cycle={}", self.cycle_nodes.join(",")));
        }
        if !self.critical_task_names.is_empty() {
            parts.push(format!("crit_path={}", self.critical_task_names.join("->")));
        }
        parts.join(", ")
    }
}

pub fn is_critical(node: &GraphNode) -> bool {
    node.buffer.abs() < CRITICAL_TOLERANCE
}

/// Critical-path method over a [`TaskGraph`].
pub struct CriticalPathAnalyzer<'a> {
    config: &'a CriticalPathConfig,
}

impl<'a> CriticalPathAnalyzer<'a> {
    pub fn new(config: &'a CriticalPathConfig) -> Self {
        Self { config }
    }

    /// Runs both passes, writing timing fields into `graph`.
    ///
    /// `order` is computed when not supplied. On cyclic input the passes still run over
    /// the partial order and the stuck nodes, and the result carries the cycle flag.
    pub fn analyze(&self, graph: &mut TaskGraph, order: Option<&TopoOrder>) -> CriticalPathResult {
        if graph.is_empty() {
            return CriticalPathResult::default();
        }

        let computed;
        let order = match order {
            Some(order) => order,
            None => {
                computed = topological_order(graph);
                &computed
            }
        };
        if order.has_cycle {
            warn!(
                cycle = ?order.cycle_nodes,
                "critical path computed over cyclic graph, timing is unreliable"
            );
        }

        let project_finish = ForwardPass::new(order).execute(graph);
        BackwardPass::new(order).execute(graph, project_finish);

        let critical_task_names: Vec<String> = order
            .extended_order()
            .filter(|name| graph.get(name).is_some_and(is_critical))
            .cloned()
            .collect();

        let edges = self.critical_edges(graph, &critical_task_names);
        debug!(
            duration = project_finish,
            critical = critical_task_names.len(),
            edges = edges.len(),
            "critical path analysis complete"
        );

        CriticalPathResult {
            edges,
            project_duration: project_finish,
            critical_task_names,
            has_cycle: order.has_cycle,
            cycle_nodes: order.cycle_nodes.clone(),
        }
    }

    fn critical_edges(&self, graph: &TaskGraph, critical: &[String]) -> Vec<CriticalPathEdge> {
        let mut edges = Vec::new();
        for name in critical {
            let Some(node) = graph.get(name) else {
                continue;
            };
            let critical_deps = node
                .dependencies
                .iter()
                .filter_map(|dep| graph.get(dep))
                .filter(|dep| is_critical(dep));

            if self.config.suppress_redundant_edges {
                // Keep the single dependency that actually gates the start; on ties the
                // latest finish wins, then declaration order.
                let chosen = critical_deps
                    .filter(|dep| {
                        (dep.earliest_finish - node.earliest_start).abs() < CRITICAL_TOLERANCE
                    })
                    .fold(None::<&GraphNode>, |best, dep| match best {
                        Some(best) if best.earliest_finish >= dep.earliest_finish => Some(best),
                        _ => Some(dep),
                    });
                if let Some(dep) = chosen {
                    edges.push(edge(dep, node));
                }
            } else {
                edges.extend(critical_deps.map(|dep| edge(dep, node)));
            }
        }
        edges
    }
}

fn edge(from: &GraphNode, to: &GraphNode) -> CriticalPathEdge {
    CriticalPathEdge {
        from_id: from.id.clone(),
        to_id: to.id.clone(),
        weight: from.weight,
    }
}

/// Convenience wrapper with the default configuration.
pub fn critical_path(graph: &mut TaskGraph) -> CriticalPathResult {
    CriticalPathAnalyzer::new(&CriticalPathConfig::default()).analyze(graph, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::task::Task;

    fn diamond() -> TaskGraph {
        GraphBuilder::from_tasks(&[
            Task::new("root", 1.0),
            Task::new("sub1", 2.0).with_depends(["root"]),
            Task::new("sub2", 3.0).with_depends(["root"]),
            Task::new("leaf", 4.0).with_depends(["sub1", "sub2"]),
        ])
        .build()
    }

    #[test]
    fn diamond_timing() {
        let mut graph = diamond();
        let result = critical_path(&mut graph);

        assert_eq!(graph.get("root").unwrap().earliest_finish, 1.0);
        assert_eq!(graph.get("sub1").unwrap().earliest_finish, 3.0);
        assert_eq!(graph.get("sub2").unwrap().earliest_finish, 4.0);
        assert_eq!(graph.get("leaf").unwrap().earliest_start, 4.0);
        assert_eq!(graph.get("sub1").unwrap().buffer, 1.0);
        assert_eq!(graph.get("sub2").unwrap().buffer, 0.0);
        assert_eq!(result.project_duration, 8.0);
        assert_eq!(result.critical_task_names, vec!["root", "sub2", "leaf"]);
        let critical = result.critical_set();
        assert_eq!(critical.len(), 3);
        assert!(critical.contains("sub2"));
        assert!(!critical.contains("sub1"));
        assert_eq!(
            result.edges,
            vec![
                CriticalPathEdge {
                    from_id: "task-0".into(),
                    to_id: "task-2".into(),
                    weight: 1.0,
                },
                CriticalPathEdge {
                    from_id: "task-2".into(),
                    to_id: "task-3".into(),
                    weight: 3.0,
                },
            ]
        );
    }

    #[test]
    fn parallel_critical_branches_keep_one_predecessor() {
        // b and c both finish at 3 and both gate d
        let tasks = [
            Task::new("a", 1.0),
            Task::new("b", 2.0).with_depends(["a"]),
            Task::new("c", 2.0).with_depends(["a"]),
            Task::new("d", 1.0).with_depends(["b", "c"]),
        ];
        let mut graph = GraphBuilder::from_tasks(&tasks).build();
        let suppressed = CriticalPathConfig {
            suppress_redundant_edges: true,
        };
        let result = CriticalPathAnalyzer::new(&suppressed).analyze(&mut graph, None);
        let into_d: Vec<_> = result.edges.iter().filter(|e| e.to_id == "task-3").collect();
        assert_eq!(into_d.len(), 1);
        assert_eq!(into_d[0].from_id, "task-1");

        let mut graph = GraphBuilder::from_tasks(&tasks).build();
        let all = CriticalPathConfig {
            suppress_redundant_edges: false,
        };
        let result = CriticalPathAnalyzer::new(&all).analyze(&mut graph, None);
        assert_eq!(result.edges.len(), 4);
    }

    #[test]
    fn cyclic_graph_does_not_panic() {
        let tasks = [
            Task::new("a", 1.0).with_depends(["b"]),
            Task::new("b", 1.0).with_depends(["a"]),
        ];
        let mut graph = GraphBuilder::from_tasks(&tasks).build();
        let result = critical_path(&mut graph);
        assert!(result.has_cycle);
        assert_eq!(result.cycle_nodes, vec!["a", "b"]);
        assert!(result.project_duration.is_finite());
    }

    #[test]
    fn empty_graph_has_zero_duration() {
        let mut graph = GraphBuilder::new().build();
        let result = critical_path(&mut graph);
        assert_eq!(result, CriticalPathResult::default());
    }
}
