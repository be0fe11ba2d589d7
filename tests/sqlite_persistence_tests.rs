#![cfg(feature = "sqlite")]

use taskgraph::{PersistenceError, SqliteTaskgraphStore, Task, Taskgraph, TaskgraphInfo, TaskgraphStore};
use tempfile::NamedTempFile;

fn sample(name: &str) -> Taskgraph {
    Taskgraph::with_tasks(
        TaskgraphInfo::named(name),
        vec![
            Task::new("design", 2.0),
            Task::new("build", 5.0).with_depends(["design"]),
        ],
    )
}

#[test]
fn sqlite_store_round_trip_taskgraph() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteTaskgraphStore::new(file.path()).unwrap();
    store.put("alpha", &sample("Alpha")).expect("save taskgraph");

    // A fresh connection sees the committed document
    let reopened = SqliteTaskgraphStore::new(file.path()).unwrap();
    let loaded = reopened.get("alpha").expect("load taskgraph");
    assert_eq!(loaded, sample("Alpha"));
    assert_eq!(loaded.find_task("build").unwrap().depends, vec!["design"]);
}

#[test]
fn put_overwrites_and_list_is_sorted() {
    let store = SqliteTaskgraphStore::in_memory().unwrap();
    store.put("zeta", &sample("Z")).unwrap();
    store.put("alpha", &sample("A")).unwrap();
    let mut changed = sample("A2");
    changed.tasks.push(Task::new("ship", 1.0).with_depends(["build"]));
    store.put("alpha", &changed).unwrap();

    assert_eq!(store.list().unwrap(), vec!["alpha", "zeta"]);
    assert_eq!(store.get("alpha").unwrap().len(), 3);
}

#[test]
fn missing_and_invalid_ids_are_errors() {
    let store = SqliteTaskgraphStore::in_memory().unwrap();
    assert!(matches!(store.get("nope"), Err(PersistenceError::NotFound(_))));
    assert!(matches!(
        store.put("../x", &sample("x")),
        Err(PersistenceError::InvalidProjectId(_))
    ));
}
