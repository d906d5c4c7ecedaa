//! Snapshot files: a flat node list stored as TOML or JSON.
//!
//! TOML snapshots hold a `[[nodes]]` array of tables. JSON snapshots are either
//! a bare array of nodes or an object with a `nodes` array; they are always
//! written back as a bare array.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::Node;

/// On-disk encoding, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Toml,
    Json,
}

impl SnapshotFormat {
    pub fn from_path(path: &Path) -> ApplicationResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(SnapshotFormat::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(SnapshotFormat::Json),
            other => Err(ApplicationError::Snapshot {
                path: path.to_path_buf(),
                message: format!(
                    "unsupported extension {:?}, expected .toml or .json",
                    other.unwrap_or("")
                ),
            }),
        }
    }
}

/// A complete tree held as a flat list of nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonSnapshot {
    List(Vec<Node>),
    Wrapped(Snapshot),
}

impl Snapshot {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Parse `content`, using the extension of `path` to pick the format.
    pub fn parse(content: &str, path: &Path) -> ApplicationResult<Self> {
        let invalid = |message: String| ApplicationError::Snapshot {
            path: path.to_path_buf(),
            message,
        };

        match SnapshotFormat::from_path(path)? {
            SnapshotFormat::Toml => toml::from_str(content).map_err(|e| invalid(e.to_string())),
            SnapshotFormat::Json => {
                let parsed: JsonSnapshot =
                    serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
                Ok(match parsed {
                    JsonSnapshot::List(nodes) => Snapshot { nodes },
                    JsonSnapshot::Wrapped(snapshot) => snapshot,
                })
            }
        }
    }

    /// Serialize in the format matching the extension of `path`.
    pub fn render(&self, path: &Path) -> ApplicationResult<String> {
        let invalid = |message: String| ApplicationError::Snapshot {
            path: path.to_path_buf(),
            message,
        };

        match SnapshotFormat::from_path(path)? {
            SnapshotFormat::Toml => toml::to_string_pretty(self).map_err(|e| invalid(e.to_string())),
            SnapshotFormat::Json => {
                let mut out =
                    serde_json::to_string_pretty(&self.nodes).map_err(|e| invalid(e.to_string()))?;
                out.push('\n');
                Ok(out)
            }
        }
    }
}
