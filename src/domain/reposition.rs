//! Reposition engine: move one node before a sibling or to the end of a group.
//!
//! Every move is validated before anything is built. A refused move returns
//! the input unchanged together with the reason; an applied move returns a
//! freshly built list and the nodes whose position or parent changed.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, trace};

use crate::domain::diff::diff;
use crate::domain::index::{find_by_id, is_descendant, max_position};
use crate::domain::observer::{MoveObserver, TracingObserver};
use crate::domain::validation::validate_unique_ids;
use crate::domain::{DomainError, Node, NodeId};

/// Destination of a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveRequest {
    /// Place the item just before `sibling`, inside the sibling's parent.
    ///
    /// A sibling without a position acts as an append target for its group.
    Before { sibling: NodeId },
    /// Append the item after every child of `parent`; `None` is the root level.
    ToEnd { parent: Option<NodeId> },
}

impl MoveRequest {
    pub fn before(sibling: impl Into<NodeId>) -> Self {
        MoveRequest::Before {
            sibling: sibling.into(),
        }
    }

    pub fn into_parent(parent: impl Into<NodeId>) -> Self {
        MoveRequest::ToEnd {
            parent: Some(parent.into()),
        }
    }

    pub fn to_root_end() -> Self {
        MoveRequest::ToEnd { parent: None }
    }
}

impl fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveRequest::Before { sibling } => write!(f, "before {sibling}"),
            MoveRequest::ToEnd { parent: Some(p) } => write!(f, "to end of {p}"),
            MoveRequest::ToEnd { parent: None } => write!(f, "to end of root"),
        }
    }
}

/// Why a move was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("no node with id {0}")]
    UnknownItem(NodeId),

    #[error("no sibling with id {0}")]
    UnknownTarget(NodeId),

    #[error("cannot move {0} before itself")]
    SelfTarget(NodeId),

    #[error("{item} cannot have a parent, refusing to nest it below {parent}")]
    RootPinned { item: NodeId, parent: NodeId },

    #[error("{parent} cannot have children")]
    ParentForbidsChildren { parent: NodeId },

    #[error("{0} cannot become its own parent")]
    SelfParent(NodeId),

    #[error("{item} cannot move below its own descendant {parent}")]
    Cycle { item: NodeId, parent: NodeId },

    #[error("duplicate id found: {0}")]
    DuplicateId(NodeId),

    #[error("no position left after {} in the destination group", u32::MAX)]
    PositionOverflow,
}

/// How far up the parent chain moves are checked for cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleCheck {
    /// Only refuse a node becoming its own direct parent.
    Direct,
    /// Refuse any destination below the moved node.
    #[default]
    Ancestors,
}

impl FromStr for CycleCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(CycleCheck::Direct),
            "ancestors" => Ok(CycleCheck::Ancestors),
            other => Err(format!(
                "invalid cycle check '{other}', expected 'direct' or 'ancestors'"
            )),
        }
    }
}

/// Rules applied on top of the placement constraints carried by nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovePolicy {
    pub cycle_check: CycleCheck,
    /// Renumber the group a node leaves so it stays contiguous
    pub compact_source: bool,
    /// Run the duplicate-id check before every move
    pub enforce_unique_ids: bool,
}

impl Default for MovePolicy {
    fn default() -> Self {
        Self {
            cycle_check: CycleCheck::Ancestors,
            compact_source: true,
            enforce_unique_ids: false,
        }
    }
}

/// Result of a move: the new list, what changed, and why it was refused if it was.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub nodes: Vec<Node>,
    pub changes: Vec<Node>,
    pub rejection: Option<Rejection>,
}

impl MoveOutcome {
    pub fn is_applied(&self) -> bool {
        self.rejection.is_none()
    }
}

enum Anchor<'a> {
    Before(&'a Node),
    End(Option<&'a NodeId>),
}

impl<'a> Anchor<'a> {
    fn parent(&self) -> Option<&'a NodeId> {
        match *self {
            Anchor::Before(target) => target.parent_id.as_ref(),
            Anchor::End(parent) => parent,
        }
    }
}

/// Applies moves under a [`MovePolicy`] and reports them to a [`MoveObserver`].
#[derive(Clone)]
pub struct Repositioner {
    policy: MovePolicy,
    observer: Arc<dyn MoveObserver>,
}

impl Default for Repositioner {
    fn default() -> Self {
        Self::new(MovePolicy::default())
    }
}

impl fmt::Debug for Repositioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repositioner")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Repositioner {
    pub fn new(policy: MovePolicy) -> Self {
        Self::with_observer(policy, Arc::new(TracingObserver))
    }

    pub fn with_observer(policy: MovePolicy, observer: Arc<dyn MoveObserver>) -> Self {
        Self { policy, observer }
    }

    pub fn policy(&self) -> &MovePolicy {
        &self.policy
    }

    /// Move the node `item_id` as described by `request`.
    #[instrument(level = "debug", skip(self, nodes), fields(nodes = nodes.len()))]
    pub fn apply(&self, nodes: &[Node], item_id: &NodeId, request: &MoveRequest) -> MoveOutcome {
        let Some(item) = find_by_id(nodes, Some(item_id)) else {
            return self.reject(nodes, item_id, Rejection::UnknownItem(item_id.clone()));
        };

        match request {
            MoveRequest::Before { sibling } => match find_by_id(nodes, Some(sibling)) {
                Some(target) => self.reposition(nodes, item, Some(target)),
                None => self.reject(nodes, item_id, Rejection::UnknownTarget(sibling.clone())),
            },
            MoveRequest::ToEnd { parent } => {
                self.run(nodes, item, None, Anchor::End(parent.as_ref()))
            }
        }
    }

    /// Move `item` just before `target`, or to the end of the root level when
    /// `target` is `None`.
    ///
    /// A target without a position is an append placeholder: the item goes to
    /// the end of the target's sibling group. Such a target need not be part of
    /// `nodes`.
    pub fn reposition(&self, nodes: &[Node], item: &Node, target: Option<&Node>) -> MoveOutcome {
        let anchor = match target {
            None => Anchor::End(None),
            Some(t) if t.position.is_none() => Anchor::End(t.parent_id.as_ref()),
            Some(t) => Anchor::Before(t),
        };
        self.run(nodes, item, target, anchor)
    }

    fn run(&self, nodes: &[Node], item: &Node, target: Option<&Node>, anchor: Anchor<'_>) -> MoveOutcome {
        // moves only ever rearrange entries already in the list
        let Some(item) = find_by_id(nodes, Some(&item.id)) else {
            return self.reject(nodes, &item.id, Rejection::UnknownItem(item.id.clone()));
        };
        if let Err(reason) = self.validate(nodes, item, target, &anchor) {
            return self.reject(nodes, &item.id, reason);
        }

        let destination = anchor.parent().cloned();
        let same_group = item.parent_id == destination;
        let mut moved = item.clone();
        let working: Vec<Node> = nodes.iter().filter(|n| n.id != item.id).cloned().collect();

        let (mut result, renumbered) = match anchor {
            Anchor::End(parent) => {
                let Some(position) = max_position(&working, parent).checked_add(1) else {
                    return self.reject(nodes, &item.id, Rejection::PositionOverflow);
                };
                moved.position = Some(position);
                moved.parent_id = destination;
                trace!(id = %moved.id, position = ?moved.position, "append");
                let mut result = working;
                result.push(moved);
                (result, false)
            }
            Anchor::Before(target) => (insert_before(working, moved, target), true),
        };

        // a ranked insert already renumbered its own group
        if self.policy.compact_source && !(same_group && renumbered) {
            compact(&mut result, item.parent_id.as_ref());
        }

        let changes: Vec<Node> = diff(nodes, &result).into_iter().cloned().collect();
        self.observer.applied(&item.id, &changes);
        MoveOutcome {
            nodes: result,
            changes,
            rejection: None,
        }
    }

    fn validate(
        &self,
        nodes: &[Node],
        item: &Node,
        target: Option<&Node>,
        anchor: &Anchor<'_>,
    ) -> Result<(), Rejection> {
        if self.policy.enforce_unique_ids {
            validate_unique_ids(nodes).map_err(|e| match e {
                DomainError::DuplicateId(id) => Rejection::DuplicateId(id),
                DomainError::NodeNotFound(_) => Rejection::UnknownItem(item.id.clone()),
            })?;
        }

        if let Some(target) = target {
            if target.id == item.id {
                return Err(Rejection::SelfTarget(item.id.clone()));
            }
        }

        let parent = anchor.parent();
        if let Some(parent) = parent {
            if !item.can_have_parent {
                return Err(Rejection::RootPinned {
                    item: item.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
        if let Some(node) = find_by_id(nodes, parent) {
            if !node.can_have_children {
                return Err(Rejection::ParentForbidsChildren {
                    parent: node.id.clone(),
                });
            }
        }
        if parent == Some(&item.id) {
            return Err(Rejection::SelfParent(item.id.clone()));
        }
        if let (CycleCheck::Ancestors, Some(parent)) = (self.policy.cycle_check, parent) {
            if is_descendant(nodes, parent, &item.id) {
                return Err(Rejection::Cycle {
                    item: item.id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        if let Anchor::Before(target) = anchor {
            if find_by_id(nodes, Some(&target.id)).is_none() {
                return Err(Rejection::UnknownTarget(target.id.clone()));
            }
        }
        Ok(())
    }

    fn reject(&self, nodes: &[Node], item: &NodeId, reason: Rejection) -> MoveOutcome {
        self.observer.rejected(item, &reason);
        MoveOutcome {
            nodes: nodes.to_vec(),
            changes: Vec::new(),
            rejection: Some(reason),
        }
    }
}

/// Insert `moved` before `target` in the target's group and renumber the group.
///
/// The rebuilt group replaces every old member and goes to the end of the list.
fn insert_before(working: Vec<Node>, mut moved: Node, target: &Node) -> Vec<Node> {
    let parent = target.parent_id.clone();
    let (mut group, mut rest): (Vec<Node>, Vec<Node>) =
        working.into_iter().partition(|n| n.parent_id == parent);

    group.sort_by_key(Node::rank);
    let index = group
        .iter()
        .position(|n| n.id == target.id)
        .unwrap_or(group.len());

    moved.parent_id = parent;
    moved.position = target.position;
    group.insert(index, moved);
    for (i, node) in group.iter_mut().enumerate() {
        node.position = Some(i as u32 + 1);
    }
    trace!(index, size = group.len(), "inserted into sibling group");

    rest.extend(group);
    rest
}

/// Renumber the group below `parent` as `1..=N`, keeping its current order.
fn compact(nodes: &mut [Node], parent: Option<&NodeId>) {
    let mut members: Vec<&mut Node> = nodes
        .iter_mut()
        .filter(|n| n.parent_id.as_ref() == parent)
        .collect();
    members.sort_by_key(|n| n.rank());
    for (i, node) in members.into_iter().enumerate() {
        node.position = Some(i as u32 + 1);
    }
}

/// Move `item` before `target` (or to the end of the root level) with the
/// default policy, returning the new list.
///
/// A refused move returns a copy of `nodes`.
pub fn reposition(nodes: &[Node], item: &Node, target: Option<&Node>) -> Vec<Node> {
    Repositioner::default().reposition(nodes, item, target).nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn siblings() -> Vec<Node> {
        vec![
            Node::new(1).at(1),
            Node::new(2).at(2),
            Node::new(3).at(3),
        ]
    }

    fn position_of(nodes: &[Node], id: i64) -> Option<u32> {
        find_by_id(nodes, Some(&NodeId::from(id))).and_then(|n| n.position)
    }

    #[test]
    fn given_last_sibling_when_moved_before_first_then_group_renumbered() {
        let nodes = siblings();
        let outcome = Repositioner::default().apply(&nodes, &3.into(), &MoveRequest::before(1));

        assert!(outcome.is_applied());
        assert_eq!(position_of(&outcome.nodes, 3), Some(1));
        assert_eq!(position_of(&outcome.nodes, 1), Some(2));
        assert_eq!(position_of(&outcome.nodes, 2), Some(3));
        assert_eq!(outcome.changes.len(), 3);
    }

    #[test]
    fn given_first_sibling_when_appended_to_own_group_then_group_compacted() {
        let nodes = siblings();
        let outcome = Repositioner::default().apply(&nodes, &1.into(), &MoveRequest::to_root_end());

        assert_eq!(position_of(&outcome.nodes, 2), Some(1));
        assert_eq!(position_of(&outcome.nodes, 3), Some(2));
        assert_eq!(position_of(&outcome.nodes, 1), Some(3));
    }

    #[test]
    fn given_compaction_disabled_when_appended_to_own_group_then_gap_remains() {
        let policy = MovePolicy {
            compact_source: false,
            ..MovePolicy::default()
        };
        let outcome =
            Repositioner::new(policy).apply(&siblings(), &1.into(), &MoveRequest::to_root_end());

        assert_eq!(position_of(&outcome.nodes, 1), Some(4));
        assert_eq!(position_of(&outcome.nodes, 2), Some(2));
    }

    #[test]
    fn given_input_when_moved_then_input_untouched() {
        let nodes = siblings();
        let copy = nodes.clone();
        let _ = reposition(&nodes, &nodes[2], Some(&nodes[0]));
        assert_eq!(nodes, copy);
    }

    #[test]
    fn given_full_destination_group_when_appending_then_rejected_without_change() {
        let nodes = vec![Node::new(1).at(u32::MAX), Node::new(2).at(1).under(1)];

        let outcome = Repositioner::default().apply(&nodes, &2.into(), &MoveRequest::to_root_end());

        assert_eq!(outcome.rejection, Some(Rejection::PositionOverflow));
        assert_eq!(outcome.nodes, nodes);
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn given_item_not_in_list_when_repositioning_then_rejected_without_change() {
        let nodes = siblings();
        let stranger = Node::new(9).at(1);

        let outcome = Repositioner::default().reposition(&nodes, &stranger, Some(&nodes[0]));

        assert_eq!(outcome.rejection, Some(Rejection::UnknownItem(9.into())));
        assert_eq!(outcome.nodes, nodes);
        assert_eq!(reposition(&nodes, &stranger, None), nodes);
    }

    #[test]
    fn given_cycle_check_values_when_parsing_then_accepts_known_names() {
        assert_eq!("Direct".parse::<CycleCheck>(), Ok(CycleCheck::Direct));
        assert_eq!("ancestors".parse::<CycleCheck>(), Ok(CycleCheck::Ancestors));
        assert!("deep".parse::<CycleCheck>().is_err());
    }

    #[test]
    fn given_requests_when_displayed_then_describe_destination() {
        assert_eq!(MoveRequest::before(4).to_string(), "before 4");
        assert_eq!(MoveRequest::into_parent("a").to_string(), "to end of a");
        assert_eq!(MoveRequest::to_root_end().to_string(), "to end of root");
    }
}
