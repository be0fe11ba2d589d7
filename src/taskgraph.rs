use crate::analysis::{self, Analysis};
use crate::calculations::{topological_order, would_create_cycle};
use crate::config::AnalysisConfig;
use crate::graph::GraphBuilder;
use crate::metadata::TaskgraphInfo;
use crate::task::{LayoutPin, Task};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskgraphError {
    #[error("task '{0}' not found")]
    UnknownTask(String),
    #[error("task '{0}' already exists")]
    DuplicateTask(String),
    #[error("task '{0}' cannot depend on itself")]
    SelfDependency(String),
    #[error("making '{dependent}' depend on '{dependency}' would create a cycle")]
    WouldCreateCycle {
        dependency: String,
        dependent: String,
    },
    #[error("invalid task: {0}")]
    InvalidTask(String),
}

/// A persisted project: `info` plus the task list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Taskgraph {
    #[serde(default)]
    pub info: TaskgraphInfo,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Taskgraph {
    pub fn new(info: TaskgraphInfo) -> Self {
        Self {
            info,
            tasks: Vec::new(),
        }
    }

    pub fn with_tasks(info: TaskgraphInfo, tasks: Vec<Task>) -> Self {
        Self { info, tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn find_task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }

    fn find_task_mut(&mut self, name: &str) -> Result<&mut Task, TaskgraphError> {
        self.tasks
            .iter_mut()
            .find(|task| task.name == name)
            .ok_or_else(|| TaskgraphError::UnknownTask(name.to_string()))
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|task| task.name.as_str())
    }

    /// Names that occur more than once. The engine keeps only the last of each.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut duplicates = Vec::new();
        for task in &self.tasks {
            let count = counts.entry(task.name.as_str()).or_default();
            *count += 1;
            if *count == 2 {
                duplicates.push(task.name.clone());
            }
        }
        duplicates
    }

    /// Replaces the task with the same name, or appends it.
    pub fn upsert_task(&mut self, task: Task) -> Result<(), TaskgraphError> {
        validate_task(&task)?;
        match self.tasks.iter_mut().find(|existing| existing.name == task.name) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
        Ok(())
    }

    /// Removes the task and strips its name from every `depends` list.
    pub fn delete_task(&mut self, name: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.name != name);
        if self.tasks.len() == before {
            return false;
        }
        for task in &mut self.tasks {
            task.depends.retain(|dep| dep != name);
        }
        debug!(task = name, "task deleted");
        true
    }

    pub fn rename_task(&mut self, old: &str, new: &str) -> Result<(), TaskgraphError> {
        if new.trim().is_empty() {
            return Err(TaskgraphError::InvalidTask("task name must not be empty".into()));
        }
        if old != new && self.find_task(new).is_some() {
            return Err(TaskgraphError::DuplicateTask(new.to_string()));
        }
        self.find_task_mut(old)?.name = new.to_string();
        for task in &mut self.tasks {
            for dep in &mut task.depends {
                if dep == old {
                    *dep = new.to_string();
                }
            }
        }
        Ok(())
    }

    /// Makes `dependent` depend on `dependency`, refusing edits that would close a loop.
    pub fn add_dependency(
        &mut self,
        dependency: &str,
        dependent: &str,
    ) -> Result<(), TaskgraphError> {
        if self.find_task(dependency).is_none() {
            return Err(TaskgraphError::UnknownTask(dependency.to_string()));
        }
        if self.find_task(dependent).is_none() {
            return Err(TaskgraphError::UnknownTask(dependent.to_string()));
        }
        if dependency == dependent {
            return Err(TaskgraphError::SelfDependency(dependent.to_string()));
        }

        let graph = GraphBuilder::from_tasks(&self.tasks).build();
        if would_create_cycle(&graph, dependency, dependent) {
            return Err(TaskgraphError::WouldCreateCycle {
                dependency: dependency.to_string(),
                dependent: dependent.to_string(),
            });
        }

        let task = self.find_task_mut(dependent)?;
        if !task.depends_on(dependency) {
            task.depends.push(dependency.to_string());
        }
        Ok(())
    }

    pub fn remove_dependency(
        &mut self,
        dependency: &str,
        dependent: &str,
    ) -> Result<bool, TaskgraphError> {
        let task = self.find_task_mut(dependent)?;
        let before = task.depends.len();
        task.depends.retain(|dep| dep != dependency);
        Ok(task.depends.len() != before)
    }

    /// Writes a grid position into `addition.layout`. The analysis never does this itself.
    pub fn set_layout(&mut self, name: &str, x: f64, y: f64) -> Result<(), TaskgraphError> {
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return Err(TaskgraphError::InvalidTask(format!(
                "layout position ({x}, {y}) must be finite and non-negative"
            )));
        }
        self.find_task_mut(name)?.set_layout_pin(LayoutPin::new(x, y));
        Ok(())
    }

    /// Tasks in dependency order; tasks stuck on a cycle follow in input order.
    pub fn sorted_tasks(&self) -> Vec<&Task> {
        let graph = GraphBuilder::from_tasks(&self.tasks).build();
        let order = topological_order(&graph);
        let by_name: HashMap<&str, &Task> = self
            .tasks
            .iter()
            .map(|task| (task.name.as_str(), task))
            .collect();
        order
            .extended_order()
            .filter_map(|name| by_name.get(name.as_str()).copied())
            .collect()
    }

    pub fn analyze(&self, config: &AnalysisConfig) -> Analysis {
        analysis::analyze(&self.tasks, config)
    }
}

pub fn validate_task(task: &Task) -> Result<(), TaskgraphError> {
    if task.name.trim().is_empty() {
        return Err(TaskgraphError::InvalidTask("task name must not be empty".into()));
    }
    if !task.difficulty.is_finite() || task.difficulty < 0.0 {
        return Err(TaskgraphError::InvalidTask(format!(
            "task '{}' has invalid difficulty {}",
            task.name, task.difficulty
        )));
    }
    Ok(())
}
