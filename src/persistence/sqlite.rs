use super::{PersistenceError, PersistenceResult, TaskgraphStore, validate_project_id};
use crate::Taskgraph;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};

pub struct SqliteTaskgraphStore {
    connection: Mutex<Connection>,
}

impl SqliteTaskgraphStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS taskgraphs (
                project_id TEXT PRIMARY KEY,
                document_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }
}

impl TaskgraphStore for SqliteTaskgraphStore {
    fn get(&self, project_id: &str) -> PersistenceResult<Taskgraph> {
        let conn = self.connection.lock();
        let mut stmt =
            conn.prepare("SELECT document_json FROM taskgraphs WHERE project_id = ?1")?;
        let json: Option<String> = stmt
            .query_row(params![project_id], |row| row.get(0))
            .optional()?;
        let Some(json) = json else {
            return Err(PersistenceError::NotFound(project_id.to_string()));
        };
        let taskgraph: Taskgraph = serde_json::from_str(&json)?;
        super::validate_taskgraph(&taskgraph)?;
        Ok(taskgraph)
    }

    fn put(&self, project_id: &str, taskgraph: &Taskgraph) -> PersistenceResult<()> {
        validate_project_id(project_id)?;
        super::validate_taskgraph(taskgraph)?;
        let json = serde_json::to_string(taskgraph)?;
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO taskgraphs (project_id, document_json) VALUES (?1, ?2)
             ON CONFLICT(project_id) DO UPDATE SET document_json = excluded.document_json",
            params![project_id, json],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list(&self) -> PersistenceResult<Vec<String>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare("SELECT project_id FROM taskgraphs ORDER BY project_id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    }
}
