//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::NodeId;

/// Domain errors represent violations of tree invariants.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("duplicate id found: {0}")]
    DuplicateId(NodeId),

    #[error("node not found: {0}")]
    NodeNotFound(String),
}
