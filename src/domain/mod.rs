//! Domain layer: entities and tree logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod diff;
pub mod entities;
pub mod error;
pub mod index;
pub mod observer;
pub mod reposition;
pub mod validation;

pub use arena::{Forest, ForestNode};
pub use diff::diff;
pub use entities::*;
pub use error::DomainError;
pub use index::{children_of, find_by_id, max_position};
pub use observer::{MoveObserver, NoopObserver, TracingObserver};
pub use reposition::{
    reposition, CycleCheck, MoveOutcome, MovePolicy, MoveRequest, Rejection, Repositioner,
};
pub use validation::validate_unique_ids;
