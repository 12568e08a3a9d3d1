mod common;

use common::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use timetree::model::{ModelState, NodeRef, Parameter, Tree, TreeParameterModel, TreeStructure};
use timetree::{TreeErrorType, TreeModel, TreeModelConfig};

fn counted(dimension: usize) -> Parameter {
    Parameter::new("trait", (0..dimension).map(|v| v as f64).collect())
}

#[test]
fn test_dimensions() {
    let tree = four_birds();
    for (include_root, include_tips, dimension) in
        [(true, true, 7), (false, true, 6), (true, false, 3), (false, false, 2)]
    {
        let model = TreeParameterModel::new(&tree, counted(dimension), include_root, include_tips).unwrap();
        assert_eq!(model.parameter().dimension(), dimension);
        assert_eq!(model.node_values().len(), dimension);
    }
}

#[test]
fn test_single_value_is_expanded() {
    let tree = four_birds();
    let model = TreeParameterModel::new(&tree, Parameter::new("rate", vec![0.3]), false, true).unwrap();
    assert_eq!(model.parameter().values(), &[0.3; 6]);
    assert_eq!(model.parameter().id(), "rate");

    let err = TreeParameterModel::new(&tree, counted(4), false, true).unwrap_err();
    assert_eq!(
        err.kind(),
        &TreeErrorType::SizeMismatch { what: "tree parameter", expected: 6, found: 4 }
    );
}

#[test]
fn test_slots_follow_node_numbers() {
    let tree = four_birds();
    let model = TreeParameterModel::new(&tree, counted(6), false, true).unwrap();

    for tip in [KEA, KAKA, TUI, BELLBIRD] {
        assert_eq!(model.node_value(&tree, tip).unwrap(), tip.index() as f64);
    }
    assert_eq!(model.node_value(&tree, PARROTS).unwrap(), 4.0);
    assert_eq!(model.node_value(&tree, HONEYEATERS).unwrap(), 5.0);
    assert!(!model.include_root());
    assert_eq!(model.root_node_number(), ROOT.index());
    assert_eq!(
        model.node_values().iter().map(|(node, _)| node.index()).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 4, 5]
    );
}

#[test]
fn test_excluded_nodes_have_no_value() {
    let tree = four_birds();
    let mut model = TreeParameterModel::new(&tree, counted(2), false, false).unwrap();

    let err = model.node_value(&tree, ROOT).unwrap_err();
    assert!(matches!(err.kind(), TreeErrorType::InvalidArgument(_)));
    assert_eq!(err.node(), Some(ROOT));
    assert!(model.node_value(&tree, KEA).is_err());
    assert!(model.set_node_value(&tree, TUI, 1.0).is_err());
    assert!(model.node_value(&tree, NodeRef::new(7)).is_err());

    model.set_node_value(&tree, HONEYEATERS, 8.0).unwrap();
    assert_eq!(model.parameter().values(), &[0.0, 8.0]);
}

#[test]
fn test_bounds_are_enforced() {
    let tree = four_birds();
    let rates = Parameter::filled("rates", 1, 1.0).with_bounds(0.0, f64::INFINITY);
    let mut model = TreeParameterModel::new(&tree, rates, true, true).unwrap();

    let err = model.set_node_value(&tree, KEA, -1.0).unwrap_err();
    assert!(matches!(err.kind(), TreeErrorType::InvalidArgument(_)));
    assert_eq!(model.node_value(&tree, KEA).unwrap(), 1.0);
}

#[test]
fn test_values_stay_with_nodes_when_root_moves() {
    let mut tree = four_birds();
    let internal = TreeParameterModel::register(&mut tree, Parameter::new("x", vec![10.0, 20.0]), false, false)
        .unwrap();
    let all = TreeParameterModel::register(&mut tree, counted(6), false, true).unwrap();

    tree.begin_edit().unwrap();
    move_root_to_parrots(&mut tree);
    tree.end_edit().unwrap();

    let internal = internal.borrow();
    assert_eq!(internal.root_node_number(), PARROTS.index());
    assert_eq!(internal.node_value(&tree, HONEYEATERS).unwrap(), 20.0);
    assert_eq!(internal.node_value(&tree, ROOT).unwrap(), 10.0);
    assert!(internal.node_value(&tree, PARROTS).is_err());

    let all = all.borrow();
    for tip in [KEA, KAKA, TUI, BELLBIRD] {
        assert_eq!(all.node_value(&tree, tip).unwrap(), tip.index() as f64);
    }
    assert_eq!(all.node_value(&tree, HONEYEATERS).unwrap(), 5.0);
    assert_eq!(all.node_value(&tree, ROOT).unwrap(), 4.0);
}

#[test]
fn test_root_included_needs_no_rotation() {
    let mut tree = four_birds();
    let model = TreeParameterModel::register(&mut tree, counted(3), true, false).unwrap();

    tree.begin_edit().unwrap();
    move_root_to_parrots(&mut tree);
    tree.end_edit().unwrap();

    let model = model.borrow();
    assert_eq!(model.root_node_number(), PARROTS.index());
    assert_eq!(model.parameter().values(), &[0.0, 1.0, 2.0]);
    assert_eq!(model.node_value(&tree, PARROTS).unwrap(), 0.0);
}

/// Random binary topology over the tips of `tree` by random joining, with
/// internal nodes numbered in random order; the last join is the root.
fn random_structure(tree: &TreeModel, rng: &mut StdRng) -> TreeStructure {
    let n = tree.node_count();
    let ext = tree.external_node_count();
    let mut numbers: Vec<usize> = (ext..n).collect();
    numbers.shuffle(rng);

    let mut edges = vec![None; n];
    let mut child_order = vec![0; n];
    let mut node_heights = vec![0.0; n];
    let mut active: Vec<usize> = (0..ext).collect();
    for (step, &parent) in numbers.iter().enumerate() {
        let first = active.swap_remove(rng.gen_range(0..active.len()));
        let second = active.swap_remove(rng.gen_range(0..active.len()));
        edges[first] = Some(parent);
        edges[second] = Some(parent);
        child_order[second] = 1;
        node_heights[parent] = (step + 1) as f64;
        active.push(parent);
    }

    TreeStructure {
        edges,
        node_heights,
        child_order,
        taxa_names: tree.taxa().iter().map(|taxon| taxon.id().to_string()).collect(),
    }
}

#[test]
fn test_values_follow_nodes_across_random_adoptions() {
    let config = TreeModelConfig::new("kiwi");
    let mut tree = TreeModel::from_newick(
        "(((Rowi:1,Tokoeka:1):1,Haast:2):1,((Brown:1,Great:1):1,Little:2):1);",
        config,
    )
    .unwrap();
    let n = tree.node_count();
    let mut rng = StdRng::seed_from_u64(7);

    for (include_tips, dimension) in [(false, 4), (true, 10)] {
        let model = TreeParameterModel::register(&mut tree, counted(dimension), false, include_tips).unwrap();

        for _ in 0..50 {
            let old_root = tree.root();
            let before: Vec<Option<f64>> = (0..n)
                .map(|i| model.borrow().node_value(&tree, NodeRef::new(i)).ok())
                .collect();

            let structure = random_structure(&tree, &mut rng);
            tree.begin_edit().unwrap();
            tree.adopt_tree_structure_flat(&structure).unwrap();
            tree.end_edit().unwrap();
            let new_root = tree.root();

            let model = model.borrow();
            assert_eq!(model.root_node_number(), new_root.index());
            for (i, value) in before.iter().enumerate() {
                let node = NodeRef::new(i);
                if node == old_root || node == new_root {
                    continue;
                }
                assert_eq!(model.node_value(&tree, node).ok(), *value, "node {}", i);
            }
            if old_root != new_root {
                assert_eq!(model.node_value(&tree, old_root).ok(), before[new_root.index()]);
            }
            assert!(model.node_value(&tree, new_root).is_err());
        }

        tree.remove_listener(&model);
    }
}

#[test]
fn test_single_tip_tree() {
    let tree = TreeModel::from_newick("Takahe;", TreeModelConfig::default()).unwrap();
    assert!(tree.is_tree_valid());

    for (include_root, include_tips) in [(false, false), (false, true), (true, false)] {
        let err = TreeParameterModel::new(&tree, Parameter::filled("r", 1, 1.0), include_root, include_tips)
            .unwrap_err();
        assert!(matches!(err.kind(), TreeErrorType::InvalidArgument(_)));
    }

    let model = TreeParameterModel::new(&tree, Parameter::filled("r", 1, 1.0), true, true).unwrap();
    assert_eq!(model.parameter().dimension(), 1);
    assert_eq!(model.node_value(&tree, tree.root()).unwrap(), 1.0);
}

#[test]
fn test_restore_without_store_fails() {
    let tree = four_birds();
    let mut model = TreeParameterModel::new(&tree, counted(2), false, false).unwrap();
    assert!(model.restore_state().unwrap_err().is_invalid_state());

    model.store_state().unwrap();
    model.set_node_value(&tree, PARROTS, 3.0).unwrap();
    model.accept_state();
    assert!(model.restore_state().is_err());
    assert_eq!(model.node_value(&tree, PARROTS).unwrap(), 3.0);
}
