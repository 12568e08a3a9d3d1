//! Listener registration and the checkpoint protocol.
//!
//! - [TreeListener]: Callbacks of a model that depends on a tree.
//! - [ModelState]: Store / restore / accept checkpoints, driven by the sampler.
//! - [ListenerRegistry]: Weak handles to registered listeners.

use crate::error::TreeError;
use crate::model::{ChangeType, NodeRef, ParameterIndex, ParameterKind, TreeChangedEvent, TreeModel};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

// =#========================================================================#=
// TREE LISTENER (Trait)
// =#========================================================================#=
/// A model that derives quantities from a [TreeModel] and must be told what changed.
///
/// Callbacks receive the tree read-only; a listener cannot mutate the tree
/// while events are delivered.
pub trait TreeListener {
    /// Called once per delivered event, in the order the events were produced.
    fn handle_model_changed(&mut self, tree: &TreeModel, event: &TreeChangedEvent);

    /// Called for per-node parameter changes, right before the matching
    /// [TreeChangedEvent::NodeParameterChanged] is passed to [Self::handle_model_changed].
    fn handle_variable_changed(
        &mut self,
        _tree: &TreeModel,
        _node: NodeRef,
        _parameter: ParameterKind,
        _index: ParameterIndex,
        _change: ChangeType,
    ) {
    }
}

// =#========================================================================#=
// MODEL STATE (Trait)
// =#========================================================================#=
/// Checkpointing of a model's state by an MCMC driver.
///
/// The driver calls `store_state` before proposing a move, then either
/// `accept_state` or `restore_state` depending on whether the move was accepted.
pub trait ModelState {
    /// Records the current state as checkpoint.
    fn store_state(&mut self) -> Result<(), TreeError>;

    /// Returns to the recorded checkpoint, consuming it.
    ///
    /// # Errors
    /// `InvalidState` if there is no checkpoint.
    fn restore_state(&mut self) -> Result<(), TreeError>;

    /// Accepts the current state; the checkpoint is discarded.
    fn accept_state(&mut self);
}

// =#========================================================================#=
// LISTENER REGISTRY
// =#========================================================================#=
/// Registered listeners of a tree, held weakly so that a dropped listener
/// does not stay alive because the tree refers to it.
#[derive(Default, Clone)]
pub struct ListenerRegistry {
    listeners: Vec<Weak<RefCell<dyn TreeListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`; events are delivered in registration order.
    pub fn add<L: TreeListener + 'static>(&mut self, listener: &Rc<RefCell<L>>) {
        let listener: Rc<RefCell<dyn TreeListener>> = listener.clone();
        self.listeners.push(Rc::downgrade(&listener));
    }

    /// Removes `listener`, returning `true` if it was registered.
    pub fn remove<L: TreeListener + 'static>(&mut self, listener: &Rc<RefCell<L>>) -> bool {
        let target = Rc::as_ptr(listener) as *const ();
        let before = self.listeners.len();
        self.listeners
            .retain(|weak| weak.as_ptr() as *const () != target);
        before != self.listeners.len()
    }

    /// Drops handles of listeners that no longer exist, returning how many were dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|weak| weak.strong_count() > 0);
        before - self.listeners.len()
    }

    /// Returns the number of registered (possibly dead) listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers `event` to all live listeners.
    ///
    /// A listener that is already borrowed misses the event; all others
    /// still receive it.
    ///
    /// # Errors
    /// `InvalidState` if a listener is already borrowed, e.g. because the
    /// caller holds it mutably while committing the tree.
    pub(crate) fn dispatch(&self, tree: &TreeModel, event: &TreeChangedEvent) -> Result<(), TreeError> {
        let mut missed = 0;
        for weak in &self.listeners {
            let Some(listener) = weak.upgrade() else {
                continue;
            };
            let Ok(mut listener) = listener.try_borrow_mut() else {
                missed += 1;
                continue;
            };
            if let TreeChangedEvent::NodeParameterChanged { node, parameter, index } = *event {
                listener.handle_variable_changed(tree, node, parameter, index, ChangeType::for_index(index));
            }
            listener.handle_model_changed(tree, event);
        }
        if missed > 0 {
            return Err(TreeError::invalid_state(format!(
                "{} listener(s) borrowed while tree events were delivered",
                missed
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
