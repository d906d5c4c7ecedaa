//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/dragtree/dragtree.toml`
//! 3. Local config: `<dir>/.dragtree.toml` (directory of the snapshot)
//! 4. Environment variables: `DRAGTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{CycleCheck, MovePolicy};

/// Raw move policy for intermediate parsing (every field optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawMovePolicy {
    pub cycle_check: Option<CycleCheck>,
    pub compact_source: Option<bool>,
    pub enforce_unique_ids: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub snapshot: Option<PathBuf>,
    pub validate_on_load: Option<bool>,
    pub moves: RawMovePolicy,
}

/// Unified configuration for dragtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Snapshot used when no file is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    /// Reject snapshots with duplicate ids when loading
    pub validate_on_load: bool,
    /// Rules applied to every move
    pub moves: MovePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshot: None,
            validate_on_load: true,
            moves: MovePolicy::default(),
        }
    }
}

/// Get the XDG config directory for dragtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dragtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("dragtree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".dragtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl MovePolicy {
    /// Overlay wins for every field it specifies.
    fn merge(&self, overlay: &RawMovePolicy) -> Self {
        Self {
            cycle_check: overlay.cycle_check.unwrap_or(self.cycle_check),
            compact_source: overlay.compact_source.unwrap_or(self.compact_source),
            enforce_unique_ids: overlay.enforce_unique_ids.unwrap_or(self.enforce_unique_ids),
        }
    }
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(snapshot) = &self.snapshot {
            self.snapshot = Some(expand_path(snapshot));
        }
    }

    /// Merge overlay config onto self (base): overlay wins if specified.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            snapshot: overlay.snapshot.clone().or_else(|| self.snapshot.clone()),
            validate_on_load: overlay.validate_on_load.unwrap_or(self.validate_on_load),
            moves: self.moves.merge(&overlay.moves),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory searched for `.dragtree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config next to the snapshot
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply DRAGTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("DRAGTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("snapshot") {
            settings.snapshot = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_bool("validate_on_load") {
            settings.validate_on_load = val;
        }
        if let Ok(val) = config.get_string("moves.cycle_check") {
            settings.moves.cycle_check = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_bool("moves.compact_source") {
            settings.moves.compact_source = val;
        }
        if let Ok(val) = config.get_bool("moves.enforce_unique_ids") {
            settings.moves.enforce_unique_ids = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# dragtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/dragtree/dragtree.toml
#   Local:  <snapshot dir>/.dragtree.toml
#   Env:    DRAGTREE_* environment variables, e.g. DRAGTREE_MOVES__CYCLE_CHECK=direct

# Snapshot used when no --file is given (~ and $VAR are expanded)
# snapshot = "~/notes/tree.toml"

# Reject snapshots with duplicate ids when loading
# validate_on_load = true

[moves]
# "ancestors": refuse moving a node below any of its descendants
# "direct":    only refuse a node becoming its own parent
# cycle_check = "ancestors"

# Renumber the sibling group a node leaves
# compact_source = true

# Check for duplicate ids before every move
# enforce_unique_ids = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
