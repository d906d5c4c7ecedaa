//! Tree index: stateless queries over a flat node list.

use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use tracing::instrument;

use crate::domain::{Node, NodeId};

/// Look up a node by id; `None` id never matches.
pub fn find_by_id<'a>(nodes: &'a [Node], id: Option<&NodeId>) -> Option<&'a Node> {
    let id = id?;
    nodes.iter().find(|n| &n.id == id)
}

/// Sibling group below `parent_id`, in list order.
///
/// A `None` parent selects the root nodes.
pub fn children_of<'a>(nodes: &'a [Node], parent_id: Option<&NodeId>) -> Vec<&'a Node> {
    nodes
        .iter()
        .filter(|n| n.parent_id.as_ref() == parent_id)
        .collect()
}

/// Largest position in the sibling group below `parent_id`, 0 when empty.
pub fn max_position(nodes: &[Node], parent_id: Option<&NodeId>) -> u32 {
    children_of(nodes, parent_id)
        .iter()
        .map(|n| n.rank())
        .max()
        .unwrap_or(0)
}

/// Parent chain of `id`, nearest first.
///
/// Stops at a root, at a parent id that names no node, or when the chain
/// revisits a node.
#[instrument(level = "trace", skip(nodes))]
pub fn ancestors(nodes: &[Node], id: &NodeId) -> Vec<NodeId> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([id]);
    let mut current = find_by_id(nodes, Some(id));

    while let Some(parent_id) = current.and_then(|n| n.parent_id.as_ref()) {
        if !seen.insert(parent_id) {
            break;
        }
        chain.push(parent_id.clone());
        current = find_by_id(nodes, Some(parent_id));
    }
    chain
}

/// Whether `ancestor` appears on the parent chain of `id`.
pub fn is_descendant(nodes: &[Node], id: &NodeId, ancestor: &NodeId) -> bool {
    ancestors(nodes, id).iter().any(|a| a == ancestor)
}

/// Parents whose sibling group is not numbered exactly `1..=N`.
///
/// `None` stands for the root group. Result is sorted.
pub fn sibling_gaps(nodes: &[Node]) -> Vec<Option<NodeId>> {
    let groups: BTreeMap<Option<&NodeId>, Vec<u32>> = nodes
        .iter()
        .map(|n| (n.parent_id.as_ref(), n.rank()))
        .into_group_map()
        .into_iter()
        .collect();

    groups
        .into_iter()
        .filter(|(_, positions)| {
            positions
                .iter()
                .sorted()
                .zip(1u32..)
                .any(|(&position, expected)| position != expected)
        })
        .map(|(parent, _)| parent.cloned())
        .collect()
}

/// Map user input to an existing id.
///
/// Numeric input prefers an integer id; otherwise the text is matched as a
/// string id.
pub fn resolve_id(nodes: &[Node], raw: &str) -> Option<NodeId> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        let id = NodeId::Int(n);
        if find_by_id(nodes, Some(&id)).is_some() {
            return Some(id);
        }
    }
    let id = NodeId::from(raw);
    find_by_id(nodes, Some(&id)).map(|_| id)
}
