//! Reposition engine scenarios on a small two-root tree.
//!
//! ```text
//! 1 (root only)        2 (root only)
//! ├── 3 (leaf)         └── 5 (leaf)
//! ├── 4 (leaf)
//! └── 6
//!     └── 7 (leaf)
//! ```

use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};

use dragtree::domain::{
    find_by_id, reposition, CycleCheck, MoveObserver, MovePolicy, MoveRequest, Node, NodeId,
    Rejection, Repositioner,
};
use dragtree::util::testing;

#[fixture]
fn nodes() -> Vec<Node> {
    testing::init_test_setup();
    vec![
        Node::new(1).with_title("Root Item 1").at(1).root_only(),
        Node::new(2).with_title("Root Item 2").at(2).root_only(),
        Node::new(3).with_title("Child Item 1").at(1).under(1).leaf(),
        Node::new(4).with_title("Child Item 2").at(2).under(1).leaf(),
        Node::new(5).with_title("Child Item 3").at(1).under(2).leaf(),
        Node::new(6).with_title("Child Item 4").at(2).under(1),
        Node::new(7).with_title("Grandchild").at(1).under(6).leaf(),
    ]
}

fn node(nodes: &[Node], id: i64) -> &Node {
    find_by_id(nodes, Some(&NodeId::from(id))).expect("node exists")
}

fn placement(nodes: &[Node], id: i64) -> (Option<u32>, Option<NodeId>) {
    let n = node(nodes, id);
    (n.position, n.parent_id.clone())
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl MoveObserver for RecordingObserver {
    fn rejected(&self, item: &NodeId, reason: &Rejection) {
        self.events
            .lock()
            .unwrap()
            .push(format!("rejected {item}: {reason}"));
    }

    fn applied(&self, item: &NodeId, changes: &[Node]) {
        self.events
            .lock()
            .unwrap()
            .push(format!("applied {item}: {} changed", changes.len()));
    }
}

// ============================================================
// Ordering within a group
// ============================================================

#[rstest]
fn given_second_root_when_moved_before_first_then_roots_swap(nodes: Vec<Node>) {
    // Act
    let result = reposition(&nodes, node(&nodes, 2), Some(node(&nodes, 1)));

    // Assert
    assert_eq!(placement(&result, 1), (Some(2), None));
    assert_eq!(placement(&result, 2), (Some(1), None));
}

#[rstest]
fn given_child_when_moved_before_earlier_sibling_then_takes_its_place(nodes: Vec<Node>) {
    // Act
    let result = reposition(&nodes, node(&nodes, 4), Some(node(&nodes, 3)));

    // Assert
    assert_eq!(placement(&result, 4), (Some(1), Some(1.into())));
    assert_eq!(placement(&result, 3), (Some(2), Some(1.into())));
    assert_eq!(placement(&result, 6), (Some(3), Some(1.into())));
}

#[rstest]
fn given_node_when_moved_before_itself_then_rejected(nodes: Vec<Node>) {
    // Act
    let outcome = Repositioner::default().apply(&nodes, &4.into(), &MoveRequest::before(4));

    // Assert
    assert_eq!(outcome.rejection, Some(Rejection::SelfTarget(4.into())));
    assert_eq!(outcome.nodes, nodes);
    assert!(outcome.changes.is_empty());
}

// ============================================================
// Moving between groups
// ============================================================

#[rstest]
fn given_child_when_moved_before_node_of_other_parent_then_reparented(nodes: Vec<Node>) {
    // Act
    let outcome = Repositioner::default().apply(&nodes, &5.into(), &MoveRequest::before(4));

    // Assert
    assert!(outcome.is_applied());
    assert_eq!(placement(&outcome.nodes, 5), (Some(2), Some(1.into())));
    assert_eq!(placement(&outcome.nodes, 4), (Some(3), Some(1.into())));
    assert_eq!(placement(&outcome.nodes, 3), (Some(1), Some(1.into())));
    assert_eq!(outcome.nodes.len(), nodes.len());
}

#[rstest]
fn given_child_when_moved_to_root_end_then_appended_after_roots(nodes: Vec<Node>) {
    // Act
    let result = reposition(&nodes, node(&nodes, 5), None);

    // Assert
    assert_eq!(placement(&result, 5), (Some(3), None));
    assert_eq!(placement(&result, 1), (Some(1), None));
    assert_eq!(placement(&result, 2), (Some(2), None));
}

#[rstest]
fn given_placeholder_target_when_moving_then_appends_to_its_group(nodes: Vec<Node>) {
    // Arrange: drop target rendered after the last child of 1, not part of the list
    let target = Node::placeholder("0", Some(1.into()));

    // Act
    let result = reposition(&nodes, node(&nodes, 5), Some(&target));

    // Assert
    assert_eq!(placement(&result, 5), (Some(3), Some(1.into())));
    assert_eq!(result.len(), nodes.len());
}

#[rstest]
fn given_into_parent_request_when_moving_then_appends_below_parent(nodes: Vec<Node>) {
    // Act
    let outcome = Repositioner::default().apply(&nodes, &3.into(), &MoveRequest::into_parent(6));

    // Assert
    assert_eq!(placement(&outcome.nodes, 3), (Some(2), Some(6.into())));
    assert_eq!(placement(&outcome.nodes, 4), (Some(1), Some(1.into())));
    assert_eq!(placement(&outcome.nodes, 6), (Some(2), Some(1.into())));
}

#[rstest]
fn given_payload_when_moving_then_carried_through(nodes: Vec<Node>) {
    // Arrange
    let mut nodes = nodes;
    nodes[4] = nodes[4]
        .clone()
        .with_payload(serde_json::json!({"color": "red"}));

    // Act
    let outcome = Repositioner::default().apply(&nodes, &5.into(), &MoveRequest::to_root_end());

    // Assert
    assert_eq!(
        node(&outcome.nodes, 5).payload,
        Some(serde_json::json!({"color": "red"}))
    );
    assert_eq!(node(&outcome.nodes, 5).title.as_deref(), Some("Child Item 3"));
}

// ============================================================
// Placement rules
// ============================================================

#[rstest]
fn given_root_only_node_when_moved_below_parent_then_rejected(nodes: Vec<Node>) {
    // Act
    let outcome = Repositioner::default().apply(&nodes, &1.into(), &MoveRequest::before(5));

    // Assert
    assert_eq!(
        outcome.rejection,
        Some(Rejection::RootPinned {
            item: 1.into(),
            parent: 2.into()
        })
    );
    assert_eq!(outcome.nodes, nodes);
}

#[rstest]
fn given_node_when_moved_before_own_child_then_rejected(nodes: Vec<Node>) {
    // Act
    let outcome = Repositioner::default().apply(&nodes, &6.into(), &MoveRequest::before(7));

    // Assert
    assert_eq!(outcome.rejection, Some(Rejection::SelfParent(6.into())));
    assert_eq!(outcome.nodes, nodes);
}

#[rstest]
fn given_leaf_parent_when_moving_into_it_then_rejected(nodes: Vec<Node>) {
    // Act
    let outcome = Repositioner::default().apply(&nodes, &4.into(), &MoveRequest::into_parent(3));

    // Assert
    assert_eq!(
        outcome.rejection,
        Some(Rejection::ParentForbidsChildren { parent: 3.into() })
    );
}

#[rstest]
#[case(CycleCheck::Ancestors, false)]
#[case(CycleCheck::Direct, true)]
fn given_cycle_check_when_moving_below_grandchild_then_policy_decides(
    #[case] cycle_check: CycleCheck,
    #[case] applied: bool,
) {
    // Arrange: a -> b -> c, moving a below c closes a cycle two levels deep
    let nodes = vec![
        Node::new("a").at(1),
        Node::new("b").at(1).under("a"),
        Node::new("c").at(1).under("b"),
    ];
    let policy = MovePolicy {
        cycle_check,
        ..MovePolicy::default()
    };

    // Act
    let outcome = Repositioner::new(policy).apply(&nodes, &"a".into(), &MoveRequest::into_parent("c"));

    // Assert
    assert_eq!(outcome.is_applied(), applied);
    if !applied {
        assert_eq!(
            outcome.rejection,
            Some(Rejection::Cycle {
                item: "a".into(),
                parent: "c".into()
            })
        );
    }
}

#[rstest]
fn given_unknown_ids_when_moving_then_rejected(nodes: Vec<Node>) {
    let repositioner = Repositioner::default();

    let missing_item = repositioner.apply(&nodes, &99.into(), &MoveRequest::before(1));
    let missing_target = repositioner.apply(&nodes, &3.into(), &MoveRequest::before(99));

    assert_eq!(missing_item.rejection, Some(Rejection::UnknownItem(99.into())));
    assert_eq!(
        missing_target.rejection,
        Some(Rejection::UnknownTarget(99.into()))
    );
}

#[rstest]
fn given_duplicate_ids_when_enforced_then_move_rejected(nodes: Vec<Node>) {
    // Arrange
    let mut nodes = nodes;
    nodes.push(Node::new(3).at(3).under(1));
    let policy = MovePolicy {
        enforce_unique_ids: true,
        ..MovePolicy::default()
    };

    // Act
    let outcome = Repositioner::new(policy).apply(&nodes, &4.into(), &MoveRequest::before(6));

    // Assert
    assert_eq!(outcome.rejection, Some(Rejection::DuplicateId(3.into())));
    assert_eq!(
        outcome.rejection.map(|r| r.to_string()).as_deref(),
        Some("duplicate id found: 3")
    );
}

// ============================================================
// Observer
// ============================================================

#[rstest]
fn given_observer_when_moving_then_reports_applied_and_rejected(nodes: Vec<Node>) {
    // Arrange
    let observer = Arc::new(RecordingObserver::default());
    let repositioner = Repositioner::with_observer(MovePolicy::default(), observer.clone());

    // Act
    repositioner.apply(&nodes, &2.into(), &MoveRequest::before(1));
    repositioner.apply(&nodes, &1.into(), &MoveRequest::before(5));

    // Assert
    let events = observer.events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            "applied 2: 2 changed".to_string(),
            "rejected 1: 1 cannot have a parent, refusing to nest it below 2".to_string(),
        ]
    );
}
