use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A pinned grid position stored under `addition.layout`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPin {
    pub x: f64,
    pub y: f64,
}

impl LayoutPin {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// A pin at the origin is what editors write before a task was ever placed,
    /// so only a nonzero position counts as authoritative.
    pub fn is_set(&self) -> bool {
        self.x != 0.0 || self.y != 0.0
    }
}

/// Free-form extras attached to a task. Unknown keys survive a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAddition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_difficulty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutPin>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One unit of work as it is persisted in a taskgraph document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addition: Option<TaskAddition>,
}

impl Task {
    pub fn new(name: impl Into<String>, difficulty: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            difficulty,
            depends: Vec::new(),
            notes: Vec::new(),
            issue_number: None,
            addition: None,
        }
    }

    pub fn with_depends<I, S>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = depends.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Dependency names with empty entries dropped, in declaration order.
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.depends
            .iter()
            .map(|name| name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.depends.iter().any(|dep| dep == name)
    }

    /// Pinned grid position, if the task carries a nonzero `addition.layout`.
    pub fn layout_pin(&self) -> Option<LayoutPin> {
        self.addition
            .as_ref()
            .and_then(|addition| addition.layout)
            .filter(LayoutPin::is_set)
    }

    pub fn set_layout_pin(&mut self, pin: LayoutPin) {
        self.addition.get_or_insert_with(TaskAddition::default).layout = Some(pin);
    }

    pub fn category(&self) -> Option<&str> {
        self.addition
            .as_ref()
            .and_then(|addition| addition.category.as_deref())
    }
}
