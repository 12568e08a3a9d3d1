//! Per-node values kept in a dense parameter vector.
//!
//! A [TreeParameterModel] stores one value per node (rates, traits, ...),
//! optionally leaving out the root and/or the tips. Slots are assigned by
//! node number; when the root is left out, the slots above the root's number
//! are shifted down by one. A move of the root therefore changes the slot of
//! every node between the old and the new root number, and the model rotates
//! that slot range so that values stay with their nodes.

use crate::error::TreeError;
use crate::model::listener::{ModelState, TreeListener};
use crate::model::{NodeRef, Parameter, Tree, TreeChangedEvent, TreeModel};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Dense per-node parameter synchronised with the numbering of a [TreeModel].
///
/// # Example
/// ```
/// use timetree::TreeModel;
/// use timetree::model::{Parameter, TreeParameterModel, Tree};
///
/// let mut tree = TreeModel::from_newick("((A:1,B:1):1,C:2);", Default::default()).unwrap();
/// let rates = Parameter::filled("rates", 1, 0.5); // expands to the tree size
/// let model = TreeParameterModel::register(&mut tree, rates, false, true).unwrap();
///
/// assert_eq!(model.borrow().parameter().dimension(), tree.node_count() - 1);
/// let a = tree.external_node(0).unwrap();
/// assert_eq!(model.borrow().node_value(&tree, a).unwrap(), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct TreeParameterModel {
    parameter: Parameter,
    include_root: bool,
    include_tips: bool,
    node_count: usize,
    external_count: usize,
    root_node_number: usize,
    stored_root_node_number: usize,
}

impl TreeParameterModel {
    /// Creates a model for `tree`.
    ///
    /// A parameter of dimension 1 is expanded to the required dimension,
    /// every slot getting its value.
    ///
    /// # Errors
    /// - `InvalidArgument` if no node is selected (e.g. a single-tip tree without root and tips)
    /// - `SizeMismatch` if the parameter has neither dimension 1 nor the required one
    pub fn new(
        tree: &TreeModel,
        parameter: Parameter,
        include_root: bool,
        include_tips: bool,
    ) -> Result<Self, TreeError> {
        let node_count = tree.node_count();
        let external_count = tree.external_node_count();
        let excluded = (if include_root { 0 } else { 1 }) + (if include_tips { 0 } else { external_count });
        let dimension = node_count
            .checked_sub(excluded)
            .filter(|&d| d > 0)
            .ok_or_else(|| TreeError::invalid_argument("selection leaves no node with a value"))?;

        let parameter = match parameter.dimension() {
            d if d == dimension => parameter,
            1 => parameter.expand(dimension)?,
            d => return Err(TreeError::size_mismatch("tree parameter", dimension, d)),
        };

        let root = tree.root().index();
        Ok(TreeParameterModel {
            parameter,
            include_root,
            include_tips,
            node_count,
            external_count,
            root_node_number: root,
            stored_root_node_number: root,
        })
    }

    /// Creates a model for `tree` and registers it as listener of `tree`.
    pub fn register(
        tree: &mut TreeModel,
        parameter: Parameter,
        include_root: bool,
        include_tips: bool,
    ) -> Result<Rc<RefCell<Self>>, TreeError> {
        let model = Rc::new(RefCell::new(Self::new(tree, parameter, include_root, include_tips)?));
        tree.add_listener(&model);
        Ok(model)
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn include_root(&self) -> bool {
        self.include_root
    }

    pub fn include_tips(&self) -> bool {
        self.include_tips
    }

    /// Returns the number of the node this model currently considers the root.
    pub fn root_node_number(&self) -> usize {
        self.root_node_number
    }

    /// Returns the value of `node`.
    ///
    /// # Errors
    /// `InvalidArgument` if `node` has no slot (excluded root or tip, or out of range).
    pub fn node_value(&self, tree: &TreeModel, node: NodeRef) -> Result<f64, TreeError> {
        let slot = self.checked_slot(tree, node)?;
        Ok(self.parameter.value(slot))
    }

    /// Sets the value of `node`.
    ///
    /// # Errors
    /// As [TreeParameterModel::node_value], plus `InvalidArgument` if the value violates the parameter bounds.
    pub fn set_node_value(&mut self, tree: &TreeModel, node: NodeRef, value: f64) -> Result<(), TreeError> {
        let slot = self.checked_slot(tree, node)?;
        self.parameter.set_value(slot, value)?;
        Ok(())
    }

    /// Returns the values of all nodes with a slot, in node order.
    pub fn node_values(&self) -> Vec<(NodeRef, f64)> {
        (0..self.parameter.dimension())
            .map(|slot| (NodeRef::new(self.node_number(slot)), self.parameter.value(slot)))
            .collect()
    }

    fn checked_slot(&self, tree: &TreeModel, node: NodeRef) -> Result<usize, TreeError> {
        if tree.node_count() != self.node_count {
            return Err(TreeError::size_mismatch("tree nodes", self.node_count, tree.node_count()));
        }
        if node.index() >= self.node_count {
            return Err(TreeError::invalid_argument("node out of range").at(node));
        }
        self.parameter_index(node.index()).ok_or_else(|| {
            let what = if node.index() == self.root_node_number { "root" } else { "tip" };
            TreeError::invalid_argument(format!("{} has no value in '{}'", what, self.parameter.id())).at(node)
        })
    }

    /// First node number that has a slot.
    fn offset(&self) -> usize {
        if self.include_tips { 0 } else { self.external_count }
    }

    /// Slot of node `number`, `None` for an excluded root or tip.
    fn parameter_index(&self, number: usize) -> Option<usize> {
        let offset = self.offset();
        if number < offset {
            return None;
        }
        if self.include_root {
            return Some(number - offset);
        }
        match number.cmp(&self.root_node_number) {
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Less => Some(number - offset),
            std::cmp::Ordering::Greater => Some(number - offset - 1),
        }
    }

    /// Node number of `slot`.
    fn node_number(&self, slot: usize) -> usize {
        let number = slot + self.offset();
        if !self.include_root && number >= self.root_node_number {
            number + 1
        } else {
            number
        }
    }

    /// Rotates the slots between the old and the new root number so that
    /// every node keeps its value; the old root takes over the value of the new root.
    fn handle_root_move(&mut self, new_root: usize) {
        let old_root = self.root_node_number;
        let offset = self.offset();
        if old_root >= offset && new_root >= offset {
            let values = self.parameter.values_mut();
            if new_root < old_root {
                values[new_root - offset..old_root - offset].rotate_left(1);
            } else {
                values[old_root - offset..new_root - offset].rotate_right(1);
            }
        }
        debug!(
            parameter = %self.parameter.id(),
            old_root,
            new_root,
            "moved root slot"
        );
        self.root_node_number = new_root;
    }
}

impl TreeListener for TreeParameterModel {
    fn handle_model_changed(&mut self, tree: &TreeModel, _event: &TreeChangedEvent) {
        let root = tree.root().index();
        if root != self.root_node_number {
            if self.include_root {
                self.root_node_number = root;
            } else {
                self.handle_root_move(root);
            }
        }
    }
}

impl ModelState for TreeParameterModel {
    fn store_state(&mut self) -> Result<(), TreeError> {
        self.parameter.store_state()?;
        self.stored_root_node_number = self.root_node_number;
        Ok(())
    }

    fn restore_state(&mut self) -> Result<(), TreeError> {
        self.parameter.restore_state()?;
        self.root_node_number = self.stored_root_node_number;
        Ok(())
    }

    fn accept_state(&mut self) {
        self.parameter.accept_state();
    }
}
