//! One full analysis run: build, order, time, measure depth, lay out, grid.
//!
//! Runs are pure. The caller's tasks are only read, every derived structure is fresh,
//! and anomalies come back as [`Diagnostic`]s rather than errors. Callers that want to
//! react while the run happens pass their own [`DiagnosticSink`].

use crate::calculations::{
    CriticalPathAnalyzer, CriticalPathEdge, CriticalPathResult, DepthReport, TopoOrder,
    compute_depths, topological_order,
};
use crate::config::AnalysisConfig;
use crate::graph::{GraphBuilder, GraphNode, TaskDag, TaskGraph};
use crate::layout::{GridItem, LayoutEngine, LayoutResult, TreeRoot, to_grid};
use crate::task::Task;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// Names the sorter could not order.
    Cycle { nodes: Vec<String> },
    /// The names that form one actual loop inside the stuck set.
    StronglyConnected { members: Vec<String> },
    /// Later occurrences replaced earlier ones.
    DuplicateName { name: String },
    DanglingDependency { task: String, dependency: String },
    /// Layout treated this node as a root despite its dependencies.
    SyntheticRoot {
        #[serde(rename = "nodeId")]
        node_id: String,
        name: String,
    },
}

impl Diagnostic {
    pub fn is_cycle(&self) -> bool {
        matches!(
            self,
            Diagnostic::Cycle { .. } | Diagnostic::StronglyConnected { .. }
        )
    }
}

/// Receiver for diagnostics, implemented by whatever presents them to a user.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::Cycle { nodes } => warn!(?nodes, "dependency cycle"),
            Diagnostic::StronglyConnected { members } => warn!(?members, "cycle members"),
            Diagnostic::DuplicateName { name } => warn!(%name, "duplicate task name"),
            Diagnostic::DanglingDependency { task, dependency } => {
                warn!(%task, %dependency, "dangling dependency")
            }
            Diagnostic::SyntheticRoot { node_id, name } => {
                warn!(%node_id, %name, "synthetic layout root")
            }
        }
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

/// Everything the UI layer renders, derived from one task snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub nodes: Vec<GraphNode>,
    pub order: TopoOrder,
    pub critical_path: CriticalPathResult,
    pub depths: DepthReport,
    pub layout: LayoutResult,
    pub grid: Vec<GridItem>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    /// False when a cycle was found; timing and critical path are then advisory.
    pub fn is_trustworthy(&self) -> bool {
        !self.order.has_cycle
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn project_duration(&self) -> f64 {
        self.critical_path.project_duration
    }

    pub fn critical_edges(&self) -> &[CriticalPathEdge] {
        &self.critical_path.edges
    }

    pub fn critical_task_names(&self) -> &[String] {
        &self.critical_path.critical_task_names
    }
}

pub fn analyze(tasks: &[Task], config: &AnalysisConfig) -> Analysis {
    analyze_with(tasks, config, &mut TracingSink)
}

pub fn analyze_with(
    tasks: &[Task],
    config: &AnalysisConfig,
    sink: &mut dyn DiagnosticSink,
) -> Analysis {
    analyze_graph(GraphBuilder::from_tasks(tasks).build(), config, sink)
}

/// Pipeline over an already built graph, for callers that assign their own node ids.
pub fn analyze_graph(
    mut graph: TaskGraph,
    config: &AnalysisConfig,
    sink: &mut dyn DiagnosticSink,
) -> Analysis {
    let mut diagnostics = Vec::new();

    for name in graph.duplicate_names() {
        diagnostics.push(Diagnostic::DuplicateName { name: name.clone() });
    }
    for (task, dependency) in graph.dangling_references() {
        diagnostics.push(Diagnostic::DanglingDependency { task, dependency });
    }

    let order = topological_order(&graph);
    if order.has_cycle {
        diagnostics.push(Diagnostic::Cycle {
            nodes: order.cycle_nodes.clone(),
        });
        for members in TaskDag::build(&graph).cycle_groups() {
            diagnostics.push(Diagnostic::StronglyConnected { members });
        }
    }

    let critical_path =
        CriticalPathAnalyzer::new(&config.critical_path).analyze(&mut graph, Some(&order));
    let depths = compute_depths(&graph);
    let layout = LayoutEngine::new(&config.layout, &config.grid).execute(&mut graph);
    for root in layout.synthetic_roots() {
        if let TreeRoot::SyntheticRoot(node_id) = root {
            let name = graph
                .node_by_id(node_id)
                .map(|node| node.name.clone())
                .unwrap_or_default();
            diagnostics.push(Diagnostic::SyntheticRoot {
                node_id: node_id.clone(),
                name,
            });
        }
    }
    let grid = to_grid(graph.nodes(), &config.grid);

    for diagnostic in &diagnostics {
        sink.report(diagnostic);
    }
    debug!(
        nodes = graph.len(),
        diagnostics = diagnostics.len(),
        "analysis complete"
    );

    Analysis {
        nodes: graph.into_nodes(),
        order,
        critical_path,
        depths,
        layout,
        grid,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_sees_every_diagnostic() {
        let tasks = vec![
            Task::new("a", 1.0).with_depends(["b", "ghost"]),
            Task::new("b", 1.0).with_depends(["a"]),
            Task::new("b", 2.0).with_depends(["a"]),
        ];
        let mut seen: Vec<Diagnostic> = Vec::new();
        let analysis = analyze_with(&tasks, &AnalysisConfig::default(), &mut seen);
        assert_eq!(seen, analysis.diagnostics);
        assert!(seen.contains(&Diagnostic::DuplicateName { name: "b".into() }));
        assert!(seen.contains(&Diagnostic::DanglingDependency {
            task: "a".into(),
            dependency: "ghost".into(),
        }));
        assert!(seen.iter().any(Diagnostic::is_cycle));
        assert!(
            seen.iter()
                .any(|d| matches!(d, Diagnostic::SyntheticRoot { .. }))
        );
        assert!(!analysis.is_trustworthy());
    }
}
