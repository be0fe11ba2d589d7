use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `info` block of a taskgraph document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskgraphInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TaskgraphInfo {
    fn default() -> Self {
        Self {
            name: "New Taskgraph".to_string(),
            description: String::new(),
            extra: Map::new(),
        }
    }
}

impl TaskgraphInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
