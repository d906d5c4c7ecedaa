use std::collections::{HashMap, HashSet};

use generational_arena::{Arena, Index};
use itertools::Itertools;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{Node, NodeId};

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct ForestNode {
    /// Snapshot of the flat node
    pub node: Node,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, ordered by position
    pub children: Vec<Index>,
}

/// Arena-based view of a flat node list.
///
/// Roots and children are ordered by position. Nodes that cannot be reached
/// from a root (dangling parent id, parent cycle) are listed as detached.
#[derive(Debug, Default)]
pub struct Forest {
    /// Arena storage for all reachable nodes
    arena: Arena<ForestNode>,
    /// Root nodes in position order
    roots: Vec<Index>,
    /// Ids of nodes not reachable from any root
    detached: Vec<NodeId>,
}

impl Forest {
    /// Build the hierarchy from a flat list.
    #[instrument(level = "debug", skip(nodes), fields(nodes = nodes.len()))]
    pub fn from_nodes(nodes: &[Node]) -> Self {
        let groups: HashMap<Option<&NodeId>, Vec<&Node>> = nodes
            .iter()
            .into_group_map_by(|n| n.parent_id.as_ref())
            .into_iter()
            .map(|(parent, group)| {
                let sorted: Vec<&Node> = group.into_iter().sorted_by_key(|n| n.rank()).collect();
                (parent, sorted)
            })
            .collect();

        let mut forest = Forest::default();
        let mut visited: HashSet<&NodeId> = HashSet::new();
        let mut stack: Vec<(&Node, Option<Index>)> = groups
            .get(&None)
            .map(|roots| roots.iter().rev().map(|n| (*n, None)).collect())
            .unwrap_or_default();

        while let Some((node, parent_idx)) = stack.pop() {
            if !visited.insert(&node.id) {
                continue;
            }
            let idx = forest.insert_node(node.clone(), parent_idx);

            // reversed so that children pop in position order
            if let Some(children) = groups.get(&Some(&node.id)) {
                for child in children.iter().rev() {
                    stack.push((*child, Some(idx)));
                }
            }
        }

        forest.detached = nodes
            .iter()
            .filter(|n| !visited.contains(&n.id))
            .map(|n| n.id.clone())
            .collect();
        forest
    }

    #[instrument(level = "trace", skip(self, node))]
    fn insert_node(&mut self, node: Node, parent: Option<Index>) -> Index {
        let idx = self.arena.insert(ForestNode {
            node,
            parent,
            children: Vec::new(),
        });

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(idx);
            }
        } else {
            self.roots.push(idx);
        }
        idx
    }

    pub fn get(&self, idx: Index) -> Option<&ForestNode> {
        self.arena.get(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn detached(&self) -> &[NodeId] {
        &self.detached
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Depth-first, pre-order traversal with the depth of each node (roots are 0).
    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self)
    }

    /// Number of levels of the deepest branch, 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(depth, _)| depth + 1).max().unwrap_or(0)
    }

    /// Ids of nodes without children, in traversal order.
    pub fn leaf_ids(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, n)| n.children.is_empty())
            .map(|(_, n)| n.node.id.clone())
            .collect()
    }

    /// Render as a `termtree` below a synthetic root labelled `label`.
    pub fn to_tree(&self, label: impl Into<String>) -> Tree<String> {
        fn build(forest: &Forest, idx: Index) -> Option<Tree<String>> {
            let node = forest.get(idx)?;
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|&child| build(forest, child))
                .collect();
            Some(Tree::new(render_label(&node.node)).with_leaves(leaves))
        }

        let leaves: Vec<_> = self
            .roots
            .iter()
            .filter_map(|&root| build(self, root))
            .collect();
        Tree::new(label.into()).with_leaves(leaves)
    }
}

fn render_label(node: &Node) -> String {
    match node.position {
        Some(position) => format!("{}. {}", position, node.label()),
        None => format!("-. {}", node.label()),
    }
}

pub struct ForestIterator<'a> {
    forest: &'a Forest,
    stack: Vec<(Index, usize)>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a Forest) -> Self {
        let stack = forest.roots.iter().rev().map(|&idx| (idx, 0)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = (usize, &'a ForestNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, depth)) = self.stack.pop() {
            if let Some(node) = self.forest.get(idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((depth, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Node> {
        vec![
            Node::new(6).at(2).under(1),
            Node::new(2).at(2),
            Node::new(3).at(1).under(1),
            Node::new(1).at(1).with_title("Root"),
            Node::new(7).at(1).under(6),
        ]
    }

    fn order(forest: &Forest) -> Vec<(usize, NodeId)> {
        forest
            .iter()
            .map(|(depth, n)| (depth, n.node.id.clone()))
            .collect()
    }

    #[test]
    fn given_unordered_list_when_building_then_traverses_by_position() {
        let forest = Forest::from_nodes(&sample());

        assert_eq!(forest.len(), 5);
        assert_eq!(
            order(&forest),
            vec![
                (0, NodeId::from(1)),
                (1, NodeId::from(3)),
                (1, NodeId::from(6)),
                (2, NodeId::from(7)),
                (0, NodeId::from(2)),
            ]
        );
        assert_eq!(forest.depth(), 3);
        assert_eq!(
            forest.leaf_ids(),
            vec![NodeId::from(3), NodeId::from(7), NodeId::from(2)]
        );
    }

    #[test]
    fn given_cycle_and_dangling_parent_when_building_then_reports_detached() {
        let mut nodes = sample();
        nodes.push(Node::new(8).under(9));
        nodes.push(Node::new(10).under(11));
        nodes.push(Node::new(11).under(10));

        let forest = Forest::from_nodes(&nodes);

        assert_eq!(forest.len(), 5);
        assert_eq!(
            forest.detached(),
            &[NodeId::from(8), NodeId::from(10), NodeId::from(11)]
        );
    }

    #[test]
    fn given_empty_list_when_building_then_empty() {
        let forest = Forest::from_nodes(&[]);
        assert!(forest.is_empty());
        assert_eq!(forest.depth(), 0);
    }

    #[test]
    fn given_forest_when_rendering_then_nests_children() {
        let forest = Forest::from_nodes(&sample());
        let rendered = forest.to_tree("tree").to_string();

        assert!(rendered.starts_with("tree\n"));
        assert!(rendered.contains("1. Root (1)"));
        let root = rendered.find("Root (1)").unwrap();
        let child = rendered.find("1. 3").unwrap();
        let grandchild = rendered.find("1. 7").unwrap();
        assert!(root < child && child < grandchild);
    }
}
