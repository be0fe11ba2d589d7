pub mod analysis;
pub mod calculations;
pub mod config;
pub mod export;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod layout;
pub mod metadata;
pub mod persistence;
pub mod task;
pub mod taskgraph;

pub use analysis::{Analysis, Diagnostic, DiagnosticSink, TracingSink, analyze, analyze_with};
pub use config::AnalysisConfig;
pub use graph::{GraphBuilder, GraphNode, TaskGraph};
pub use metadata::TaskgraphInfo;
pub use persistence::{PersistenceError, TaskgraphStore};
pub use task::{LayoutPin, Task, TaskAddition};
pub use taskgraph::{Taskgraph, TaskgraphError};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteTaskgraphStore;
