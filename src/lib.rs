//! dragtree: ordered multi-root trees stored as flat node lists.
//!
//! Nodes carry a parent reference and a 1-based position among their
//! siblings. The [`domain::Repositioner`] moves a node before a sibling or to
//! the end of a parent's children, renumbering the affected sibling groups
//! and refusing moves that would break the placement rules.
//!
//! Layers, inner to outer:
//! - [`domain`]: nodes, the reposition engine, validation, arena view
//! - [`application`]: snapshot files and the tree service
//! - [`infrastructure`]: filesystem abstraction and service wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
