pub mod backward_pass;
pub mod critical_path;
pub mod depth;
pub mod forward_pass;
pub mod topo;

pub use critical_path::{
    CRITICAL_TOLERANCE, CriticalPathAnalyzer, CriticalPathEdge, CriticalPathResult, critical_path,
};
pub use depth::{DepthContext, DepthReport, compute_depths, would_create_cycle};
pub use topo::{TopoOrder, TopologicalSorter, topological_order};
