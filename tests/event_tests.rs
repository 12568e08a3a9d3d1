mod common;

use common::*;
use std::cell::RefCell;
use std::rc::Rc;
use timetree::model::{
    ChangeType, HeightParameter, ModelState, ParameterIndex, ParameterKind, Tree, TreeChangedEvent,
    TreeListener,
};
use timetree::{TreeErrorType, TreeModel};

#[test]
fn test_events_are_held_until_commit() {
    let mut tree = four_birds();
    let recorder = recorder(&mut tree);

    tree.begin_edit().unwrap();
    tree.set_node_height(PARROTS, 1.5).unwrap();
    tree.remove_child(HONEYEATERS, TUI).unwrap();
    tree.add_child(HONEYEATERS, TUI).unwrap();
    assert!(recorder.borrow().events.is_empty());
    assert_eq!(tree.pending_events().len(), 3);

    tree.end_edit().unwrap();
    assert!(tree.pending_events().is_empty());
    assert_eq!(
        recorder.borrow().events,
        vec![
            TreeChangedEvent::height_changed(PARROTS, ParameterIndex::Dimension(0)),
            TreeChangedEvent::node_changed(HONEYEATERS),
            TreeChangedEvent::node_changed(HONEYEATERS),
        ]
    );
}

#[test]
fn test_root_move_events() {
    let mut tree = four_birds();
    let recorder = recorder(&mut tree);

    tree.begin_edit().unwrap();
    move_root_to_parrots(&mut tree);
    tree.end_edit().unwrap();

    let events = &recorder.borrow().events;
    assert_eq!(events.len(), 14);
    assert_eq!(events[12], TreeChangedEvent::node_changed(PARROTS));
    assert!(events[13].is_height_changed());
}

#[test]
fn test_listeners_in_registration_order() {
    let mut tree = four_birds();
    let first = recorder(&mut tree);

    // Shared log to see the interleaving across listeners
    struct Tagged {
        tag: &'static str,
        log: Rc<RefCell<Vec<(&'static str, TreeChangedEvent)>>>,
    }
    impl TreeListener for Tagged {
        fn handle_model_changed(&mut self, _tree: &TreeModel, event: &TreeChangedEvent) {
            self.log.borrow_mut().push((self.tag, *event));
        }
    }

    let log = Rc::new(RefCell::new(Vec::new()));
    let a = Rc::new(RefCell::new(Tagged { tag: "a", log: log.clone() }));
    let b = Rc::new(RefCell::new(Tagged { tag: "b", log: log.clone() }));
    tree.add_listener(&a);
    tree.add_listener(&b);
    assert_eq!(tree.listener_count(), 3);

    tree.begin_edit().unwrap();
    tree.swap_children(PARROTS).unwrap();
    tree.swap_children(HONEYEATERS).unwrap();
    tree.end_edit().unwrap();

    let first_swap = TreeChangedEvent::NodeOrderChanged { node: PARROTS };
    let second_swap = TreeChangedEvent::NodeOrderChanged { node: HONEYEATERS };
    assert_eq!(
        *log.borrow(),
        vec![("a", first_swap), ("b", first_swap), ("a", second_swap), ("b", second_swap)]
    );
    assert_eq!(first.borrow().events, vec![first_swap, second_swap]);
}

#[test]
fn test_variable_change_precedes_model_change() {
    let mut tree = four_birds();
    let recorder = recorder(&mut tree);

    tree.begin_edit().unwrap();
    tree.set_node_height(PARROTS, 1.5).unwrap();
    tree.swap_children(ROOT).unwrap();
    tree.end_edit().unwrap();

    let recorder = recorder.borrow();
    assert_eq!(recorder.calls, vec!["variable", "model", "model"]);
    assert_eq!(
        recorder.variables,
        vec![(PARROTS, ParameterKind::Height, ParameterIndex::Dimension(0), ChangeType::ValueChanged)]
    );
}

#[test]
fn test_height_parameter_changes() {
    let mut tree = four_birds();
    let recorder = recorder(&mut tree);
    let parameter: HeightParameter = tree.node_height_parameter(HONEYEATERS).unwrap();

    tree.begin_edit().unwrap();
    tree.set_parameter_value(&parameter, 1.25).unwrap();
    tree.handle_variable_changed(&parameter, ParameterIndex::Dimension(0), ChangeType::AllValuesChanged)
        .unwrap();
    tree.end_edit().unwrap();

    assert_eq!(tree.node_height(HONEYEATERS), 1.25);
    assert_eq!(
        recorder.borrow().events,
        vec![
            TreeChangedEvent::height_changed(HONEYEATERS, ParameterIndex::Dimension(0)),
            TreeChangedEvent::height_changed(HONEYEATERS, ParameterIndex::All),
        ]
    );
    assert_eq!(recorder.borrow().variables[1].3, ChangeType::AllValuesChanged);
}

#[test]
fn test_node_heights_parameter_events() {
    let mut tree = four_birds();
    let recorder = recorder(&mut tree);
    let internal = tree.create_node_heights_parameter(true, true, false).unwrap();

    tree.begin_edit().unwrap();
    internal.set_value(&mut tree, 1, 0.5).unwrap();
    internal.set_values(&mut tree, &[0.75, 0.5, 2.5]).unwrap();
    let err = internal.set_values(&mut tree, &[1.0]).unwrap_err();
    assert!(matches!(err.kind(), TreeErrorType::SizeMismatch { .. }));
    assert!(internal.set_value(&mut tree, 3, 1.0).is_err());
    tree.end_edit().unwrap();

    assert_eq!(internal.values(&tree), vec![0.75, 0.5, 2.5]);
    assert_eq!(
        recorder.borrow().events,
        vec![
            TreeChangedEvent::height_changed(HONEYEATERS, ParameterIndex::Dimension(1)),
            TreeChangedEvent::height_changed(PARROTS, ParameterIndex::All),
            TreeChangedEvent::height_changed(HONEYEATERS, ParameterIndex::All),
            TreeChangedEvent::height_changed(ROOT, ParameterIndex::All),
        ]
    );
}

#[test]
fn test_failed_commit_delivers_nothing() {
    let mut tree = four_birds();
    let recorder = recorder(&mut tree);

    tree.store_state().unwrap();
    tree.begin_edit().unwrap();
    tree.set_node_height(TUI, 1.5).unwrap();
    assert!(tree.end_edit().unwrap_err().is_invalid_tree());

    assert!(recorder.borrow().events.is_empty());
    assert!(recorder.borrow().calls.is_empty());
}

#[test]
fn test_borrowed_listener_is_an_error() {
    let mut tree = four_birds();
    let before = recorder(&mut tree);
    let busy = recorder(&mut tree);
    let after = recorder(&mut tree);

    tree.begin_edit().unwrap();
    tree.set_node_height(PARROTS, 1.5).unwrap();
    tree.set_node_height(HONEYEATERS, 1.25).unwrap();
    let held = busy.borrow_mut();
    let err = tree.end_edit().unwrap_err();
    assert!(err.is_invalid_state());
    drop(held);

    // The commit itself went through
    assert!(!tree.is_editing());
    assert_eq!(tree.node_height(PARROTS), 1.5);

    // Every other listener still saw the whole batch in order
    let expected = vec![
        TreeChangedEvent::height_changed(PARROTS, ParameterIndex::Dimension(0)),
        TreeChangedEvent::height_changed(HONEYEATERS, ParameterIndex::Dimension(0)),
    ];
    assert_eq!(before.borrow().events, expected);
    assert_eq!(after.borrow().events, expected);
    assert!(busy.borrow().events.is_empty());
}

#[test]
fn test_dropped_listener_is_pruned() {
    let mut tree = four_birds();
    let recorder = recorder(&mut tree);
    assert_eq!(tree.listener_count(), 1);
    drop(recorder);

    tree.begin_edit().unwrap();
    tree.set_node_height(PARROTS, 1.5).unwrap();
    tree.end_edit().unwrap();
    assert_eq!(tree.listener_count(), 0);
}

#[test]
fn test_remove_listener() {
    let mut tree = four_birds();
    let removed = recorder(&mut tree);
    let kept = recorder(&mut tree);

    assert!(tree.remove_listener(&removed));
    assert!(!tree.remove_listener(&removed));

    tree.begin_edit().unwrap();
    tree.swap_children(ROOT).unwrap();
    tree.end_edit().unwrap();

    assert!(removed.borrow().events.is_empty());
    assert_eq!(kept.borrow().events.len(), 1);
}

#[test]
fn test_push_while_idle_is_delivered_at_once() {
    let mut tree = four_birds();
    let recorder = recorder(&mut tree);

    tree.push_tree_changed_event(TreeChangedEvent::WholeTree).unwrap();
    assert_eq!(recorder.borrow().events, vec![TreeChangedEvent::WholeTree]);
}

#[test]
fn test_adopt_is_a_whole_tree_change() {
    let mut tree = four_birds();
    let recorder = recorder(&mut tree);
    let structure = tree.export_tree_structure();

    tree.begin_edit().unwrap();
    tree.adopt_tree_structure_flat(&structure).unwrap();
    tree.end_edit().unwrap();

    assert_eq!(recorder.borrow().events, vec![TreeChangedEvent::WholeTree]);
}
