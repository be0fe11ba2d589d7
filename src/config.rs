//! Tunables for one analysis run.
//!
//! Everything has a default, and every section is optional in the JSON form, so a config
//! file only has to name what it changes:
//!
//! ```json
//! { "layout": { "nodeWidth": 240 }, "criticalPath": { "suppressRedundantEdges": false } }
//! ```

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "TASKGRAPH_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CriticalPathConfig {
    /// Emit one predecessor edge per critical node instead of every critical pair.
    pub suppress_redundant_edges: bool,
}

impl Default for CriticalPathConfig {
    fn default() -> Self {
        Self {
            suppress_redundant_edges: true,
        }
    }
}

/// Pixel geometry of the flow diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Space between level columns.
    pub horizontal_gap: f64,
    /// Space between nodes stacked in one column.
    pub vertical_gap: f64,
    /// Space between stacked trees.
    pub tree_gap: f64,
    pub padding: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 200.0,
            node_height: 80.0,
            horizontal_gap: 80.0,
            vertical_gap: 40.0,
            tree_gap: 80.0,
            padding: 40.0,
        }
    }
}

/// Discrete grid used by grid-based widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    pub cell_width: f64,
    pub cell_height: f64,
    pub columns: u32,
    pub item_width: u32,
    pub item_height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_width: 20.0,
            cell_height: 20.0,
            columns: 96,
            item_width: 10,
            item_height: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub critical_path: CriticalPathConfig,
    pub layout: LayoutConfig,
    pub grid: GridConfig,
}

impl AnalysisConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by `TASKGRAPH_CONFIG`, or the defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::from_json_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        let sizes = [
            ("nodeWidth", layout.node_width),
            ("nodeHeight", layout.node_height),
        ];
        for (name, value) in sizes {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "layout.{name} must be positive (got {value})"
                )));
            }
        }
        let gaps = [
            ("horizontalGap", layout.horizontal_gap),
            ("verticalGap", layout.vertical_gap),
            ("treeGap", layout.tree_gap),
            ("padding", layout.padding),
        ];
        for (name, value) in gaps {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "layout.{name} must be non-negative (got {value})"
                )));
            }
        }

        let grid = &self.grid;
        if !(grid.cell_width.is_finite() && grid.cell_width > 0.0)
            || !(grid.cell_height.is_finite() && grid.cell_height > 0.0)
        {
            return Err(ConfigError::Invalid("grid cell pitch must be positive".into()));
        }
        if grid.item_width == 0 || grid.item_height == 0 {
            return Err(ConfigError::Invalid("grid item size must be at least one cell".into()));
        }
        if grid.item_width > grid.columns {
            return Err(ConfigError::Invalid(format!(
                "grid.itemWidth {} exceeds grid.columns {}",
                grid.item_width, grid.columns
            )));
        }
        Ok(())
    }
}
