//! Input validation for node snapshots.

use itertools::Itertools;

use crate::domain::{DomainError, Node};

/// Check that every id occurs once.
///
/// Reports the first id seen twice, scanning in list order. Meant to run once
/// when external data is loaded, not on every move.
pub fn validate_unique_ids(nodes: &[Node]) -> Result<(), DomainError> {
    match nodes.iter().map(|n| &n.id).duplicates().next() {
        Some(id) => Err(DomainError::DuplicateId(id.clone())),
        None => Ok(()),
    }
}
