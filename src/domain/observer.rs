//! Observation hooks for the reposition engine.

use tracing::{debug, info};

use crate::domain::{Node, NodeId, Rejection};

/// Receives the outcome of every move.
///
/// Both methods default to doing nothing.
pub trait MoveObserver: Send + Sync {
    /// A move was refused; the snapshot is unchanged.
    fn rejected(&self, item: &NodeId, reason: &Rejection) {
        let _ = (item, reason);
    }

    /// A move was applied; `changes` lists every node whose position or parent changed.
    fn applied(&self, item: &NodeId, changes: &[Node]) {
        let _ = (item, changes);
    }
}

/// Emits moves as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MoveObserver for TracingObserver {
    fn rejected(&self, item: &NodeId, reason: &Rejection) {
        info!(%item, %reason, "move rejected");
    }

    fn applied(&self, item: &NodeId, changes: &[Node]) {
        debug!(%item, changed = changes.len(), "move applied");
        for node in changes {
            debug!(
                id = %node.id,
                position = ?node.position,
                parent = ?node.parent_id,
                "repositioned"
            );
        }
    }
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MoveObserver for NoopObserver {}
