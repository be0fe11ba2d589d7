use crate::Taskgraph;
use crate::taskgraph::{TaskgraphError, validate_task};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid project id '{0}'")]
    InvalidProjectId(String),
    #[error("project '{0}' not found")]
    NotFound(String),
}

impl From<TaskgraphError> for PersistenceError {
    fn from(value: TaskgraphError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Key-value document store for taskgraphs. Single writer; no locking protocol beyond
/// what an implementation needs internally.
pub trait TaskgraphStore {
    fn get(&self, project_id: &str) -> PersistenceResult<Taskgraph>;
    fn put(&self, project_id: &str, taskgraph: &Taskgraph) -> PersistenceResult<()>;
    /// Project ids in ascending order.
    fn list(&self) -> PersistenceResult<Vec<String>>;
}

/// Shape check applied before anything is written or after anything is read.
pub fn validate_taskgraph(taskgraph: &Taskgraph) -> PersistenceResult<()> {
    for task in &taskgraph.tasks {
        validate_task(task)?;
    }
    Ok(())
}

/// Project ids double as file names, so they are restricted to a safe alphabet.
pub fn validate_project_id(project_id: &str) -> PersistenceResult<()> {
    let valid = !project_id.is_empty()
        && project_id.len() <= 128
        && !project_id.starts_with('.')
        && project_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidProjectId(project_id.to_string()))
    }
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{JsonDirStore, load_taskgraph_from_json, save_taskgraph_to_json};
pub use memory::InMemoryStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_ids_reject_paths() {
        assert!(validate_project_id("roadmap-2025").is_ok());
        assert!(validate_project_id("v1.2_plan").is_ok());
        assert!(validate_project_id("").is_err());
        assert!(validate_project_id("../etc").is_err());
        assert!(validate_project_id("a/b").is_err());
        assert!(validate_project_id(".hidden").is_err());
    }
}
