use super::{PersistenceError, PersistenceResult, TaskgraphStore, validate_project_id};
use crate::Taskgraph;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Process-local store, used by tests and by the HTTP server without a data directory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: RwLock<BTreeMap<String, Taskgraph>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskgraphStore for InMemoryStore {
    fn get(&self, project_id: &str) -> PersistenceResult<Taskgraph> {
        self.documents
            .read()
            .get(project_id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(project_id.to_string()))
    }

    fn put(&self, project_id: &str, taskgraph: &Taskgraph) -> PersistenceResult<()> {
        validate_project_id(project_id)?;
        super::validate_taskgraph(taskgraph)?;
        self.documents
            .write()
            .insert(project_id.to_string(), taskgraph.clone());
        Ok(())
    }

    fn list(&self) -> PersistenceResult<Vec<String>> {
        Ok(self.documents.read().keys().cloned().collect())
    }
}
