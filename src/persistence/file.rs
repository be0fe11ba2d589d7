use super::{PersistenceError, PersistenceResult, TaskgraphStore, validate_project_id};
use crate::Taskgraph;
use chrono::Local;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub fn save_taskgraph_to_json<P: AsRef<Path>>(
    taskgraph: &Taskgraph,
    path: P,
) -> PersistenceResult<()> {
    super::validate_taskgraph(taskgraph)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, taskgraph)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn load_taskgraph_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Taskgraph> {
    let file = File::open(path)?;
    let taskgraph: Taskgraph = serde_json::from_reader(BufReader::new(file))?;
    super::validate_taskgraph(&taskgraph)?;
    Ok(taskgraph)
}

/// One pretty-printed `<project_id>.json` per project.
///
/// Overwriting a project first copies the previous document into
/// `backups/<project_id>-<timestamp>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> PersistenceResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    fn document_path(&self, project_id: &str) -> PathBuf {
        self.root.join(format!("{project_id}.json"))
    }

    fn backup(&self, project_id: &str, current: &Path) -> PersistenceResult<PathBuf> {
        let dir = self.backup_dir();
        fs::create_dir_all(&dir)?;
        let stamp = Local::now().format("%Y%m%dT%H%M%S%.3f");
        let target = dir.join(format!("{project_id}-{stamp}.json"));
        fs::copy(current, &target)?;
        debug!(project = project_id, backup = %target.display(), "previous document backed up");
        Ok(target)
    }
}

impl TaskgraphStore for JsonDirStore {
    fn get(&self, project_id: &str) -> PersistenceResult<Taskgraph> {
        validate_project_id(project_id)?;
        let path = self.document_path(project_id);
        if !path.is_file() {
            return Err(PersistenceError::NotFound(project_id.to_string()));
        }
        load_taskgraph_from_json(path)
    }

    fn put(&self, project_id: &str, taskgraph: &Taskgraph) -> PersistenceResult<()> {
        validate_project_id(project_id)?;
        super::validate_taskgraph(taskgraph)?;
        let path = self.document_path(project_id);
        if path.is_file() {
            self.backup(project_id, &path)?;
        }

        // Write beside the target and rename so readers never see half a document
        let staging = self.root.join(format!(".{project_id}.json.tmp"));
        save_taskgraph_to_json(taskgraph, &staging)?;
        fs::rename(&staging, &path)?;
        info!(project = project_id, tasks = taskgraph.len(), "taskgraph saved");
        Ok(())
    }

    fn list(&self) -> PersistenceResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if validate_project_id(stem).is_ok() {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
