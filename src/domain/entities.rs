//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Serialize};

/// Node identifier.
///
/// Identifiers are opaque and compared by value, so the integer `1` and
/// the string `"1"` name different nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(i64),
    Str(String),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Int(n) => write!(f, "{n}"),
            NodeId::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        NodeId::Int(value)
    }
}

impl From<i32> for NodeId {
    fn from(value: i32) -> Self {
        NodeId::Int(i64::from(value))
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId::Str(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId::Str(value)
    }
}

fn default_true() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One item of an ordered, multi-root tree.
///
/// The tree is held as a flat list: hierarchy is expressed through
/// `parent_id`, ordering among siblings through the 1-based `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    /// Display label, never interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// 1-based rank among siblings; `None` means "append at end"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Owning node, `None` for root level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// `false` pins the node to root level
    #[serde(default = "default_true")]
    pub can_have_parent: bool,
    /// `false` forbids nesting anything below this node
    #[serde(default = "default_true")]
    pub can_have_children: bool,
    /// Drop target supplied by a presentation layer
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_placeholder: bool,
    /// Caller data, carried through moves untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            position: None,
            parent_id: None,
            can_have_parent: true,
            can_have_children: true,
            is_placeholder: false,
            payload: None,
        }
    }

    /// Placeholder marking "end of the children of `parent`".
    pub fn placeholder(id: impl Into<NodeId>, parent: Option<NodeId>) -> Self {
        Self {
            parent_id: parent,
            is_placeholder: true,
            ..Self::new(id)
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn at(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn under(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Pin the node to root level.
    pub fn root_only(mut self) -> Self {
        self.can_have_parent = false;
        self
    }

    /// Forbid children below this node.
    pub fn leaf(mut self) -> Self {
        self.can_have_children = false;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Sort key within a sibling group; an absent position ranks as 0.
    pub fn rank(&self) -> u32 {
        self.position.unwrap_or(0)
    }

    /// Human readable label: title when present, id otherwise.
    pub fn label(&self) -> String {
        match &self.title {
            Some(title) => format!("{} ({})", title, self.id),
            None if self.is_placeholder => format!("<placeholder {}>", self.id),
            None => self.id.to_string(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_integer_and_string_ids_when_compared_then_are_distinct() {
        assert_ne!(NodeId::from(1), NodeId::from("1"));
        assert_eq!(NodeId::from("01"), NodeId::Str("01".into()));
    }

    #[test]
    fn given_minimal_json_when_deserializing_then_applies_defaults() {
        let node: Node = serde_json::from_str(r#"{"id": 3, "parentId": "a"}"#).unwrap();

        assert_eq!(node.id, NodeId::Int(3));
        assert_eq!(node.parent_id, Some(NodeId::from("a")));
        assert_eq!(node.position, None);
        assert!(node.can_have_parent);
        assert!(node.can_have_children);
        assert!(!node.is_placeholder);
    }

    #[test]
    fn given_node_when_serializing_then_skips_absent_fields() {
        let node = Node::new(1).at(2);
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "position": 2,
                "canHaveParent": true,
                "canHaveChildren": true
            })
        );
    }

    #[test]
    fn given_titled_node_when_displayed_then_shows_title_and_id() {
        let node = Node::new("x").with_title("Inbox");
        assert_eq!(node.to_string(), "Inbox (x)");
        assert_eq!(Node::new(7).to_string(), "7");
    }
}
