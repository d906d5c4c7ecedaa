//! Tree snapshot service
//!
//! Loads and saves snapshot files, applies moves under the configured policy
//! and checks snapshots for structural problems.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt, Snapshot};
use crate::config::Settings;
use crate::domain::index::{resolve_id, sibling_gaps};
use crate::domain::{
    validate_unique_ids, DomainError, Forest, MoveObserver, MoveOutcome, MoveRequest, NodeId,
    Repositioner, TracingObserver,
};
use crate::infrastructure::traits::FileSystem;

/// Structural findings that do not prevent using a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Parents whose children are not numbered `1..=N` (`None` is the root level)
    pub gaps: Vec<Option<NodeId>>,
    /// Nodes not reachable from a root
    pub detached: Vec<NodeId>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.gaps.is_empty() && self.detached.is_empty()
    }
}

/// Service for working with tree snapshots.
pub struct TreeService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    repositioner: Repositioner,
}

impl TreeService {
    /// Create a new tree service logging moves through `tracing`.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self::with_observer(fs, settings, Arc::new(TracingObserver))
    }

    /// Create a tree service reporting moves to `observer`.
    pub fn with_observer(
        fs: Arc<dyn FileSystem>,
        settings: Arc<Settings>,
        observer: Arc<dyn MoveObserver>,
    ) -> Self {
        let repositioner = Repositioner::with_observer(settings.moves, observer);
        Self {
            fs,
            settings,
            repositioner,
        }
    }

    /// Read a snapshot without any checks.
    #[instrument(level = "debug", skip(self))]
    pub fn read(&self, path: &Path) -> ApplicationResult<Snapshot> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("snapshot not found: {}", path.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            });
        }
        let content = self.fs.read_to_string(path).with_path_context("read snapshot", path)?;
        let snapshot = Snapshot::parse(&content, path)?;
        debug!("read: {} nodes from {}", snapshot.nodes.len(), path.display());
        Ok(snapshot)
    }

    /// Read a snapshot and, when `validate_on_load` is set, reject duplicate ids.
    pub fn load(&self, path: &Path) -> ApplicationResult<Snapshot> {
        let snapshot = self.read(path)?;
        if self.settings.validate_on_load {
            validate_unique_ids(&snapshot.nodes)?;
        }
        Ok(snapshot)
    }

    /// Write a snapshot in the format given by the extension of `path`.
    #[instrument(level = "debug", skip(self, snapshot), fields(nodes = snapshot.nodes.len()))]
    pub fn save(&self, path: &Path, snapshot: &Snapshot) -> ApplicationResult<()> {
        let content = snapshot.render(path)?;
        self.fs
            .write(path, &content)
            .with_path_context("write snapshot", path)?;
        info!("saved {} nodes to {}", snapshot.nodes.len(), path.display());
        Ok(())
    }

    /// Map user input to an id present in the snapshot.
    pub fn resolve(&self, snapshot: &Snapshot, raw: &str) -> ApplicationResult<NodeId> {
        resolve_id(&snapshot.nodes, raw)
            .ok_or_else(|| DomainError::NodeNotFound(raw.to_string()).into())
    }

    /// Apply a single move; the snapshot itself is left untouched.
    pub fn move_node(&self, snapshot: &Snapshot, item: &NodeId, request: &MoveRequest) -> MoveOutcome {
        self.repositioner.apply(&snapshot.nodes, item, request)
    }

    /// Duplicate ids are an error; gaps and detached nodes are reported.
    #[instrument(level = "debug", skip(self, snapshot))]
    pub fn validate(&self, snapshot: &Snapshot) -> ApplicationResult<ValidationReport> {
        validate_unique_ids(&snapshot.nodes)?;

        let report = ValidationReport {
            gaps: sibling_gaps(&snapshot.nodes),
            detached: Forest::from_nodes(&snapshot.nodes).detached().to_vec(),
        };
        if !report.is_clean() {
            warn!(
                gaps = report.gaps.len(),
                detached = report.detached.len(),
                "snapshot has structural issues"
            );
        }
        Ok(report)
    }

    /// Arena view of the snapshot for display.
    pub fn forest(&self, snapshot: &Snapshot) -> Forest {
        Forest::from_nodes(&snapshot.nodes)
    }
}
