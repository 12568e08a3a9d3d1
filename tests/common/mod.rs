#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use timetree::model::{
    ChangeType, NodeRef, ParameterIndex, ParameterKind, TreeChangedEvent, TreeListener,
};
use timetree::{TreeModel, TreeModelConfig};

/// Kea 0, Kaka 1, Tui 2, Bellbird 3, (Kea,Kaka) 4, (Tui,Bellbird) 5, root 6
pub const FOUR_BIRDS: &str = "((Kea:1,Kaka:1):1,(Tui:1,Bellbird:1):1);";

pub const KEA: NodeRef = NodeRef::new(0);
pub const KAKA: NodeRef = NodeRef::new(1);
pub const TUI: NodeRef = NodeRef::new(2);
pub const BELLBIRD: NodeRef = NodeRef::new(3);
pub const PARROTS: NodeRef = NodeRef::new(4);
pub const HONEYEATERS: NodeRef = NodeRef::new(5);
pub const ROOT: NodeRef = NodeRef::new(6);

pub fn four_birds() -> TreeModel {
    TreeModel::from_newick(FOUR_BIRDS, TreeModelConfig::new("birds")).unwrap()
}

/// Rebuilds the four-bird tree inside an open transaction so that node 4
/// becomes the root: `(((Kaka,Tui)5,Kea)6,Bellbird)4` with heights 1, 2, 3.
pub fn move_root_to_parrots(tree: &mut TreeModel) {
    for (parent, child) in [
        (ROOT, PARROTS),
        (ROOT, HONEYEATERS),
        (PARROTS, KEA),
        (PARROTS, KAKA),
        (HONEYEATERS, TUI),
        (HONEYEATERS, BELLBIRD),
    ] {
        tree.remove_child(parent, child).unwrap();
    }
    for (parent, child) in [
        (HONEYEATERS, KAKA),
        (HONEYEATERS, TUI),
        (ROOT, HONEYEATERS),
        (ROOT, KEA),
        (PARROTS, ROOT),
        (PARROTS, BELLBIRD),
    ] {
        tree.add_child(parent, child).unwrap();
    }
    tree.set_root(PARROTS).unwrap();
    tree.set_node_height(PARROTS, 3.0).unwrap();
}

/// Listener recording everything it is told.
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<TreeChangedEvent>,
    pub variables: Vec<(NodeRef, ParameterKind, ParameterIndex, ChangeType)>,
    pub calls: Vec<&'static str>,
}

impl TreeListener for Recorder {
    fn handle_model_changed(&mut self, _tree: &TreeModel, event: &TreeChangedEvent) {
        self.events.push(*event);
        self.calls.push("model");
    }

    fn handle_variable_changed(
        &mut self,
        _tree: &TreeModel,
        node: NodeRef,
        parameter: ParameterKind,
        index: ParameterIndex,
        change: ChangeType,
    ) {
        self.variables.push((node, parameter, index, change));
        self.calls.push("variable");
    }
}

pub fn recorder(tree: &mut TreeModel) -> Rc<RefCell<Recorder>> {
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    tree.add_listener(&recorder);
    recorder
}
