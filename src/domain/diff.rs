//! Change detection between two snapshots.

use std::collections::HashMap;

use crate::domain::{Node, NodeId};

/// Nodes of `after` that are new or whose position or parent differ from
/// the node with the same id in `before`.
///
/// Comparison is by id, result keeps the order of `after`.
pub fn diff<'a>(before: &[Node], after: &'a [Node]) -> Vec<&'a Node> {
    let previous: HashMap<&NodeId, &Node> = before.iter().map(|n| (&n.id, n)).collect();

    after
        .iter()
        .filter(|n| match previous.get(&n.id) {
            None => true,
            Some(prev) => prev.position != n.position || prev.parent_id != n.parent_id,
        })
        .collect()
}
