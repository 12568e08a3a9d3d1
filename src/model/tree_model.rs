//! The mutable, time-calibrated tree model.
//!
//! [TreeModel] owns an arena of [Node] records. Every change goes through an
//! edit transaction:
//!
//! ```text
//! Idle ──→ begin_edit() ──→ Editing ──→ add_child/remove_child/set_root/set_node_height ──→ end_edit() ──→ Idle
//!   ↑                                                                                                   │
//!   └──────────────────────────── validate, then deliver queued events in order ─────────────────────────┘
//! ```
//!
//! A commit that fails validation returns [InvalidTree](crate::TreeErrorType::InvalidTree),
//! drops the queued events and leaves the edited (invalid) tree in place.
//! The caller rejects the move by calling [ModelState::restore_state].

use crate::config::TreeModelConfig;
use crate::error::TreeError;
use crate::model::bounds::{NodeHeightBounds, lower_height_bound, upper_height_bound};
use crate::model::heights::{HeightParameter, NodeHeightsParameter};
use crate::model::listener::{ListenerRegistry, ModelState, TreeListener};
use crate::model::perturbation::{HeightPerturbation, SeededJitter};
use crate::model::structure::TreeStructure;
use crate::model::{
    ChangeType, FlexibleTree, Node, NodeRef, ParameterIndex, Taxon, TaxonList, Tree, TreeChangedEvent,
};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// State of the edit-transaction controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// No transaction open; mutators are rejected.
    Idle,
    /// Between `begin_edit` and `end_edit`; events are queued.
    Editing,
}

// =#========================================================================#=
// TREE MODEL
// =#========================================================================#=
/// A strictly binary rooted tree whose node heights are MCMC state.
///
/// # Structure
/// - Tips are nodes `[0, external_node_count)`, internal nodes the rest
/// - At construction the root is the node with the highest index;
///   later edits may move the root to any internal node
/// - Tip `i` carries taxon `i` of [TreeModel::taxa]
/// - Heights and rates live in the [Node] records; bounds are derived on demand
///
/// # Example
/// ```
/// use timetree::TreeModel;
/// use timetree::model::{ModelState, Tree};
///
/// let mut tree = TreeModel::from_newick("((A:1,B:1):1,(C:1,D:1):1);", Default::default()).unwrap();
/// let a = tree.external_node(0).unwrap();
///
/// tree.store_state().unwrap();
/// tree.begin_edit().unwrap();
/// tree.set_node_height(a, 2.5).unwrap(); // older than its parent
/// assert!(tree.end_edit().unwrap_err().is_invalid_tree());
///
/// tree.restore_state().unwrap();
/// assert_eq!(tree.node_height(a), 0.0);
/// ```
#[derive(Debug)]
pub struct TreeModel {
    id: String,
    config: TreeModelConfig,

    /// Node records (arena)
    nodes: Vec<Node>,
    root: NodeRef,
    external_count: usize,
    taxa: TaxonList,

    /// Checkpoint
    stored_nodes: Vec<Node>,
    stored_root: NodeRef,
    /// Taxa before the first rename since `store_state`
    stored_taxa: Option<TaxonList>,
    has_checkpoint: bool,

    state: EditState,
    pending: Vec<TreeChangedEvent>,
    listeners: ListenerRegistry,

    has_rates: bool,
    tip_date_sampled: bool,
}

// ============================================================================
// Construction (pub)
// ============================================================================
impl TreeModel {
    /// Builds a tree model from `tree`, lifting nodes that are not older than
    /// their children with a [SeededJitter] of fixed default seed.
    ///
    /// # Errors
    /// See [TreeModel::with_perturbation].
    pub fn new(tree: FlexibleTree, config: TreeModelConfig) -> Result<Self, TreeError> {
        let mut policy = SeededJitter::default();
        Self::with_perturbation(tree, config, &mut policy)
    }

    /// Builds a tree model from `tree`.
    ///
    /// The input is resolved into a strictly binary tree, node heights are
    /// corrected with `policy` (unless `config.fix_heights`), and nodes are
    /// numbered in post-order: tips `0..`, internal nodes after them, the
    /// root last.
    ///
    /// # Errors
    /// `InvalidArgument` if the tree is empty, has no root, has a tip without
    /// taxon or two tips with the same taxon.
    pub fn with_perturbation<P: HeightPerturbation + ?Sized>(
        mut tree: FlexibleTree,
        config: TreeModelConfig,
        policy: &mut P,
    ) -> Result<Self, TreeError> {
        if tree.node_count() == 0 || !tree.is_root_set() {
            return Err(TreeError::invalid_argument("input tree is empty or has no root"));
        }

        let resolved = tree.resolve_tree();
        let corrected = if config.fix_heights {
            0
        } else {
            tree.correct_heights_for_tips(policy)
        };

        let node_count = tree.node_count();
        let external_count = tree.external_node_count();

        // Post-order numbering: tips in traversal order first, root last
        let mut numbers = vec![NodeRef::new(0); node_count];
        let mut taxa = TaxonList::with_capacity(external_count);
        let (mut next_tip, mut next_internal) = (0, external_count);
        for node in tree.post_order() {
            if tree.is_external(node) {
                let taxon = tree
                    .taxon(node)
                    .ok_or_else(|| TreeError::invalid_argument("tip without taxon").at(node))?;
                if taxa.contains(taxon.id()) {
                    return Err(TreeError::invalid_argument(format!("duplicate taxon '{}'", taxon.id())));
                }
                taxa.get_or_insert(taxon.id());
                numbers[node.index()] = NodeRef::new(next_tip);
                next_tip += 1;
            } else {
                numbers[node.index()] = NodeRef::new(next_internal);
                next_internal += 1;
            }
        }

        let mut nodes = vec![Node::new(0.0); node_count];
        for index in 0..node_count {
            let source = NodeRef::new(index);
            let node = &mut nodes[numbers[index].index()];
            node.height = tree.node_height(source);
            node.parent = tree.parent(source).map(|p| numbers[p.index()]);
            for i in 0..tree.child_count(source) {
                if let Some(child) = tree.child(source, i) {
                    node.link_child(numbers[child.index()]);
                }
            }
        }
        let root = numbers[tree.root().index()];

        debug!(
            tree = %config.id,
            nodes = node_count,
            tips = external_count,
            resolved,
            corrected,
            "built tree model"
        );

        Ok(TreeModel {
            id: config.id.clone(),
            config,
            stored_nodes: nodes.clone(),
            nodes,
            root,
            external_count,
            taxa,
            stored_root: root,
            stored_taxa: None,
            has_checkpoint: false,
            state: EditState::Idle,
            pending: Vec::new(),
            listeners: ListenerRegistry::new(),
            has_rates: false,
            tip_date_sampled: false,
        })
    }

    /// Parses a single Newick tree (heights from branch lengths) and builds a tree model from it.
    ///
    /// # Errors
    /// `Parsing` if the string is not valid Newick, otherwise as [TreeModel::new].
    pub fn from_newick(newick: &str, config: TreeModelConfig) -> Result<Self, TreeError> {
        let tree = crate::newick::parse_str(newick)?;
        Self::new(tree, config)
    }
}

// ============================================================================
// Getters / Accessors (pub)
// ============================================================================
impl TreeModel {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &TreeModelConfig {
        &self.config
    }

    /// Returns the state of the edit-transaction controller.
    pub fn edit_state(&self) -> EditState {
        self.state
    }

    pub fn is_editing(&self) -> bool {
        self.state == EditState::Editing
    }

    /// Returns the taxa, taxon `i` belonging to tip `i`.
    pub fn taxa(&self) -> &TaxonList {
        &self.taxa
    }

    /// Returns all node records, indexed by node number.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the `i`-th tip, `None` if out of range.
    pub fn external_node(&self, i: usize) -> Option<NodeRef> {
        (i < self.external_count).then(|| NodeRef::new(i))
    }

    /// Returns the `i`-th internal node, `None` if out of range.
    pub fn internal_node(&self, i: usize) -> Option<NodeRef> {
        (i < self.nodes.len() - self.external_count).then(|| NodeRef::new(self.external_count + i))
    }

    /// Returns the lower bound of the height of `node`.
    pub fn height_lower_bound(&self, node: NodeRef) -> f64 {
        lower_height_bound(self, node)
    }

    /// Returns the upper bound of the height of `node`.
    pub fn height_upper_bound(&self, node: NodeRef) -> f64 {
        upper_height_bound(self, node)
    }

    /// Returns the bounds of all node heights, dimension `i` being node `i`.
    pub fn height_bounds(&self) -> NodeHeightBounds<'_, Self> {
        NodeHeightBounds::new(self)
    }

    /// Returns the rate of `node`, `1.0` if rates have not been created.
    pub fn node_rate(&self, node: NodeRef) -> f64 {
        if self.has_rates { self[node].rate } else { 1.0 }
    }

    pub fn has_node_rates(&self) -> bool {
        self.has_rates
    }

    /// Returns `true` once a tip height has been handed out for sampling.
    pub fn is_tip_date_sampled(&self) -> bool {
        self.tip_date_sampled
    }

    /// Returns the index of the taxon with this id, `None` if absent.
    pub fn taxon_index(&self, id: &str) -> Option<usize> {
        self.taxa.index_of(id)
    }

    /// Returns the tips carrying the given taxa, in the given order.
    ///
    /// # Errors
    /// `MissingTaxon` naming the first id that is not a taxon of this tree.
    pub fn tip_nodes_for_taxa<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<NodeRef>, TreeError> {
        ids.iter()
            .map(|id| {
                self.taxon_index(id.as_ref())
                    .map(NodeRef::new)
                    .ok_or_else(|| TreeError::missing_taxon(id.as_ref()))
            })
            .collect()
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Tree for TreeModel {
    fn root(&self) -> NodeRef {
        self.root
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn external_node_count(&self) -> usize {
        self.external_count
    }

    fn child_count(&self, node: NodeRef) -> usize {
        self[node].child_count()
    }

    fn child(&self, node: NodeRef, i: usize) -> Option<NodeRef> {
        let node = &self[node];
        [node.left, node.right].into_iter().flatten().nth(i)
    }

    fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self[node].parent
    }

    fn node_height(&self, node: NodeRef) -> f64 {
        self[node].height
    }

    fn taxon(&self, node: NodeRef) -> Option<&Taxon> {
        if node.index() < self.external_count {
            self.taxa.get(node.index())
        } else {
            None
        }
    }

    fn is_external(&self, node: NodeRef) -> bool {
        node.index() < self.external_count
    }
}

impl std::ops::Index<NodeRef> for TreeModel {
    type Output = Node;

    fn index(&self, node: NodeRef) -> &Self::Output {
        &self.nodes[node.index()]
    }
}

impl fmt::Display for TreeModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&crate::newick::to_newick(self))
    }
}

// ============================================================================
// Edit transactions (pub)
// ============================================================================
impl TreeModel {
    /// Opens an edit transaction.
    ///
    /// # Errors
    /// `InvalidState` if a transaction is already open.
    pub fn begin_edit(&mut self) -> Result<(), TreeError> {
        if self.state == EditState::Editing {
            return Err(TreeError::invalid_state("begin_edit while already editing"));
        }
        self.state = EditState::Editing;
        debug!(tree = %self.id, "begin edit");
        Ok(())
    }

    /// Commits the open transaction.
    ///
    /// Validates the tree (if `validate_on_commit`), then delivers the queued
    /// events to every listener in the order they were produced. The
    /// controller is `Idle` afterwards whatever the outcome.
    ///
    /// # Errors
    /// - `InvalidState` if no transaction is open, or a listener is borrowed
    ///   elsewhere during delivery; every other listener still receives
    ///   every event
    /// - `InvalidTree` if validation fails; the queued events are discarded
    ///   and the tree keeps its edited state until restored
    pub fn end_edit(&mut self) -> Result<(), TreeError> {
        if self.state != EditState::Editing {
            return Err(TreeError::invalid_state("end_edit without matching begin_edit"));
        }
        self.state = EditState::Idle;

        if self.config.validate_on_commit {
            if let Err(err) = self.check_tree_is_valid() {
                warn!(
                    tree = %self.id,
                    error = %err,
                    discarded = self.pending.len(),
                    "rejected tree edit"
                );
                self.pending.clear();
                return Err(err);
            }
        }

        let events = std::mem::take(&mut self.pending);
        self.prune_listeners();
        debug!(tree = %self.id, events = events.len(), "commit edit");
        let mut first_error = None;
        for event in &events {
            trace!(tree = %self.id, %event, "dispatch");
            if let Err(err) = self.listeners.dispatch(&*self, event) {
                warn!(tree = %self.id, %event, error = %err, "event not delivered to every listener");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Queues `event`, or delivers it right away if no transaction is open.
    ///
    /// # Errors
    /// `InvalidState` if the tree is fixed, or on listener re-entrancy.
    pub fn push_tree_changed_event(&mut self, event: TreeChangedEvent) -> Result<(), TreeError> {
        if self.config.fix_tree {
            return Err(TreeError::invalid_state("change event on a fixed tree"));
        }
        match self.state {
            EditState::Editing => {
                trace!(tree = %self.id, %event, "queue");
                self.pending.push(event);
                Ok(())
            }
            EditState::Idle => {
                self.prune_listeners();
                trace!(tree = %self.id, %event, "dispatch");
                self.listeners.dispatch(&*self, &event)
            }
        }
    }

    /// Returns the events queued in the open transaction.
    pub fn pending_events(&self) -> &[TreeChangedEvent] {
        &self.pending
    }

    /// Sets the height of `node` and queues the matching event.
    pub fn set_node_height(&mut self, node: NodeRef, height: f64) -> Result<(), TreeError> {
        self.set_node_height_with_index(node, height, ParameterIndex::Dimension(0))
    }

    /// Sets the height of `node` without queueing an event; the caller is
    /// expected to push a coarser event itself.
    pub fn set_node_height_quietly(&mut self, node: NodeRef, height: f64) -> Result<(), TreeError> {
        self.check_mutable("set_node_height_quietly")?;
        self.check_node(node)?;
        self.nodes[node.index()].height = height;
        Ok(())
    }

    pub(crate) fn set_node_height_with_index(
        &mut self,
        node: NodeRef,
        height: f64,
        index: ParameterIndex,
    ) -> Result<(), TreeError> {
        self.set_node_height_quietly(node, height)?;
        self.push_tree_changed_event(TreeChangedEvent::height_changed(node, index))
    }

    /// Sets the rate of `node`.
    ///
    /// # Errors
    /// `InvalidState` outside a transaction or if rates have not been created.
    pub fn set_node_rate(&mut self, node: NodeRef, rate: f64) -> Result<(), TreeError> {
        self.check_mutable("set_node_rate")?;
        self.check_node(node)?;
        if !self.has_rates {
            return Err(TreeError::invalid_state("node rates have not been created"));
        }
        self.nodes[node.index()].rate = rate;
        self.push_tree_changed_event(TreeChangedEvent::rate_changed(node))
    }

    /// Links `child` below `parent`.
    ///
    /// # Errors
    /// `InvalidArgument` if `child` is already a child of `parent`, already has
    /// another parent, or `parent` already has two children.
    pub fn add_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), TreeError> {
        self.check_mutable("add_child")?;
        self.check_node(parent)?;
        self.check_node(child)?;
        if parent == child {
            return Err(TreeError::invalid_argument("node cannot be its own child").at(child));
        }
        if self[parent].has_child(child) {
            return Err(TreeError::invalid_argument("child already present").at(child));
        }
        if self[child].parent.is_some() {
            return Err(TreeError::invalid_argument("node already has a parent").at(child));
        }
        if !self.nodes[parent.index()].link_child(child) {
            return Err(TreeError::invalid_argument("node already has two children").at(parent));
        }
        self.nodes[child.index()].parent = Some(parent);
        self.push_tree_changed_event(TreeChangedEvent::node_changed(parent))
    }

    /// Unlinks `child` from `parent`.
    ///
    /// # Errors
    /// `InvalidArgument` if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), TreeError> {
        self.check_mutable("remove_child")?;
        self.check_node(parent)?;
        self.check_node(child)?;
        if !self.nodes[parent.index()].unlink_child(child) {
            return Err(TreeError::invalid_argument("node is not a child of the given parent").at(child));
        }
        self.nodes[child.index()].parent = None;
        self.push_tree_changed_event(TreeChangedEvent::node_changed(parent))
    }

    /// Makes `node` the root.
    pub fn set_root(&mut self, node: NodeRef) -> Result<(), TreeError> {
        self.check_mutable("set_root")?;
        self.check_node(node)?;
        self.root = node;
        self.push_tree_changed_event(TreeChangedEvent::node_changed(node))
    }

    /// Swaps the left and right child of `node`.
    ///
    /// # Errors
    /// `InvalidArgument` if `node` does not have two children.
    pub fn swap_children(&mut self, node: NodeRef) -> Result<(), TreeError> {
        self.check_mutable("swap_children")?;
        self.check_node(node)?;
        if self[node].children().is_none() {
            return Err(TreeError::invalid_argument("swapping children requires two children").at(node));
        }
        self.nodes[node.index()].swap_children();
        self.push_tree_changed_event(TreeChangedEvent::NodeOrderChanged { node })
    }

    /// Replaces the taxon of tip `node`. A later `restore_state` brings the
    /// previous taxon back.
    ///
    /// # Errors
    /// - `InvalidState` outside a transaction
    /// - `InvalidArgument` if `node` is not a tip or another tip already carries `taxon`
    pub fn set_node_taxon(&mut self, node: NodeRef, taxon: Taxon) -> Result<(), TreeError> {
        self.check_mutable("set_node_taxon")?;
        if node.index() >= self.external_count {
            return Err(TreeError::invalid_argument("only tips carry taxa").at(node));
        }
        if let Some(other) = self.taxa.index_of(taxon.id()) {
            if other != node.index() {
                return Err(TreeError::invalid_argument(format!(
                    "taxon '{}' already belongs to tip {}",
                    taxon.id(),
                    other
                )));
            }
        }
        if self.has_checkpoint && self.stored_taxa.is_none() {
            self.stored_taxa = Some(self.taxa.clone());
        }
        self.taxa.replace(node.index(), taxon);
        self.push_tree_changed_event(TreeChangedEvent::node_changed(node))
    }

    /// Enables per-node rates, all starting at `1.0`.
    pub fn create_node_rates(&mut self) {
        if !self.has_rates {
            for node in self.nodes.iter_mut().chain(self.stored_nodes.iter_mut()) {
                node.rate = 1.0;
            }
            self.has_rates = true;
        }
    }

    fn check_mutable(&self, operation: &str) -> Result<(), TreeError> {
        if self.state != EditState::Editing {
            return Err(TreeError::invalid_state(format!(
                "{} outside of an edit transaction",
                operation
            )));
        }
        if self.config.fix_tree {
            return Err(TreeError::invalid_state(format!("{} on a fixed tree", operation)));
        }
        Ok(())
    }

    fn check_node(&self, node: NodeRef) -> Result<(), TreeError> {
        if node.index() >= self.nodes.len() {
            return Err(TreeError::invalid_argument(format!(
                "node index {} out of range for tree with {} nodes",
                node.index(),
                self.nodes.len()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Listeners (pub)
// ============================================================================
impl TreeModel {
    /// Registers `listener`; events are delivered in registration order.
    ///
    /// The tree holds the listener weakly.
    pub fn add_listener<L: TreeListener + 'static>(&mut self, listener: &Rc<RefCell<L>>) {
        self.listeners.add(listener);
    }

    /// Unregisters `listener`, returning `true` if it was registered.
    pub fn remove_listener<L: TreeListener + 'static>(&mut self, listener: &Rc<RefCell<L>>) -> bool {
        self.listeners.remove(listener)
    }

    fn prune_listeners(&mut self) {
        let pruned = self.listeners.prune();
        if pruned > 0 {
            warn!(tree = %self.id, pruned, "dropped listeners still registered");
        }
    }
}

// ============================================================================
// Validation (pub)
// ============================================================================
impl TreeModel {
    /// Returns `true` if the tree passes [TreeModel::check_tree_is_valid].
    pub fn is_tree_valid(&self) -> bool {
        self.check_tree_is_valid().is_ok()
    }

    /// Validates structure and node heights.
    ///
    /// Checks:
    /// - The root has no parent; every other node has one
    /// - Parent and child links mirror each other
    /// - Tips have no children, internal nodes exactly two
    /// - All nodes are reachable from the root
    /// - Every height lies within its bounds (up to `bounds_epsilon`)
    ///
    /// # Errors
    /// `InvalidTree` naming the first offending node.
    pub fn check_tree_is_valid(&self) -> Result<(), TreeError> {
        let n = self.nodes.len();
        if self.root.index() >= n {
            return Err(TreeError::invalid_tree("root out of range"));
        }
        if self[self.root].parent.is_some() {
            return Err(TreeError::invalid_tree("root has a parent").at(self.root));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let this = NodeRef::new(index);

            for child in [node.left, node.right].into_iter().flatten() {
                if child.index() >= n || self[child].parent != Some(this) {
                    return Err(TreeError::invalid_tree("child does not link back to its parent").at(this));
                }
            }

            match node.parent {
                Some(parent) => {
                    if parent.index() >= n || !self[parent].has_child(this) {
                        return Err(TreeError::invalid_tree("parent does not link to node").at(this));
                    }
                }
                None if this != self.root => {
                    return Err(TreeError::invalid_tree("node is detached from the tree").at(this));
                }
                None => {}
            }

            if index < self.external_count {
                if node.child_count() != 0 {
                    return Err(TreeError::invalid_tree("tip has children").at(this));
                }
            } else if node.child_count() != 2 {
                return Err(TreeError::invalid_tree("internal node does not have two children").at(this));
            }
        }

        let mut visited = vec![false; n];
        let mut stack = vec![self.root];
        let mut reached = 0;
        while let Some(node) = stack.pop() {
            if visited[node.index()] {
                return Err(TreeError::invalid_tree("cycle in tree").at(node));
            }
            visited[node.index()] = true;
            reached += 1;
            stack.extend([self[node].left, self[node].right].into_iter().flatten());
        }
        if reached != n {
            return Err(TreeError::invalid_tree(format!(
                "only {} of {} nodes reachable from the root",
                reached, n
            )));
        }

        if let Some(node) = self.height_bounds().first_violation(self.config.bounds_epsilon) {
            return Err(TreeError::invalid_tree(format!(
                "height {} outside bounds [{}, {}]",
                self.node_height(node),
                self.height_lower_bound(node),
                self.height_upper_bound(node)
            ))
            .at(node));
        }
        Ok(())
    }
}

// ============================================================================
// Height parameters (pub)
// ============================================================================
impl TreeModel {
    /// Returns the handle of the height cell of `node`.
    pub fn node_height_parameter(&self, node: NodeRef) -> Result<HeightParameter, TreeError> {
        self.check_node(node)?;
        Ok(HeightParameter::new(&self.id, node))
    }

    /// Returns the height cell of tip `node` and marks the tree as tip-date sampled.
    ///
    /// # Errors
    /// `InvalidArgument` if `node` is not a tip.
    pub fn leaf_height_parameter(&mut self, node: NodeRef) -> Result<HeightParameter, TreeError> {
        self.check_node(node)?;
        if node.index() >= self.external_count {
            return Err(TreeError::invalid_argument("leaf height requested for internal node").at(node));
        }
        self.tip_date_sampled = true;
        Ok(HeightParameter::new(&self.id, node))
    }

    /// Returns the node owning `parameter`.
    ///
    /// # Errors
    /// `InvalidArgument` if the handle belongs to another tree or is out of range.
    pub fn node_of_parameter(&self, parameter: &HeightParameter) -> Result<NodeRef, TreeError> {
        if parameter.tree_id() != self.id {
            return Err(TreeError::invalid_argument(format!(
                "parameter '{}' does not belong to tree '{}'",
                parameter.id(),
                self.id
            )));
        }
        self.check_node(parameter.node())?;
        Ok(parameter.node())
    }

    /// Returns the value of the height cell `parameter`.
    pub fn parameter_value(&self, parameter: &HeightParameter) -> Result<f64, TreeError> {
        let node = self.node_of_parameter(parameter)?;
        Ok(self.node_height(node))
    }

    /// Writes the height cell `parameter` and reports the change through
    /// [TreeModel::handle_variable_changed].
    pub fn set_parameter_value(&mut self, parameter: &HeightParameter, value: f64) -> Result<(), TreeError> {
        let node = self.node_of_parameter(parameter)?;
        self.set_node_height_quietly(node, value)?;
        self.handle_variable_changed(parameter, ParameterIndex::Dimension(0), ChangeType::ValueChanged)
    }

    /// Maps a changed height cell back to its node and pushes the matching
    /// [TreeChangedEvent::NodeParameterChanged] (`ParameterIndex::All` for
    /// [ChangeType::AllValuesChanged]).
    pub fn handle_variable_changed(
        &mut self,
        parameter: &HeightParameter,
        index: ParameterIndex,
        change: ChangeType,
    ) -> Result<(), TreeError> {
        let node = self.node_of_parameter(parameter)?;
        let index = match change {
            ChangeType::ValueChanged => index,
            ChangeType::AllValuesChanged => ParameterIndex::All,
        };
        self.push_tree_changed_event(TreeChangedEvent::height_changed(node, index))
    }

    /// Creates a compound view over the selected node heights.
    ///
    /// # Errors
    /// `InvalidArgument` if none of root, internal nodes and tips is selected.
    pub fn create_node_heights_parameter(
        &self,
        root: bool,
        internal: bool,
        tips: bool,
    ) -> Result<NodeHeightsParameter, TreeError> {
        NodeHeightsParameter::new(self, root, internal, tips)
    }
}

// ============================================================================
// Bulk import / export (pub)
// ============================================================================
impl TreeModel {
    /// Copies topology and heights from `donor`.
    ///
    /// Donor tips are matched by taxon id; donor internal nodes are matched
    /// by their order in the donor's numbering. Queues a
    /// [TreeChangedEvent::WholeTree]. Nothing changes on error.
    ///
    /// # Errors
    /// - `SizeMismatch` if node or tip counts differ
    /// - `MissingTaxon` if a donor tip has no or an unknown taxon
    /// - `InvalidArgument` if two donor tips share a taxon or a donor node has more than two children
    pub fn adopt_tree_structure<T: Tree + ?Sized>(&mut self, donor: &T) -> Result<(), TreeError> {
        self.check_mutable("adopt_tree_structure")?;
        let n = self.nodes.len();
        if donor.node_count() != n {
            return Err(TreeError::size_mismatch("donor nodes", n, donor.node_count()));
        }
        if donor.external_node_count() != self.external_count {
            return Err(TreeError::size_mismatch(
                "donor tips",
                self.external_count,
                donor.external_node_count(),
            ));
        }

        let mut map = Vec::with_capacity(n);
        let mut used = vec![false; self.external_count];
        let mut next_internal = self.external_count;
        for index in 0..n {
            let source = NodeRef::new(index);
            if donor.child_count(source) == 0 {
                let taxon = donor
                    .taxon(source)
                    .ok_or_else(|| TreeError::missing_taxon(format!("donor tip {} has no taxon", index)))?;
                let tip = self
                    .taxon_index(taxon.id())
                    .ok_or_else(|| TreeError::missing_taxon(taxon.id()))?;
                if std::mem::replace(&mut used[tip], true) {
                    return Err(TreeError::invalid_argument(format!("donor taxon '{}' appears twice", taxon.id())));
                }
                map.push(NodeRef::new(tip));
            } else {
                map.push(NodeRef::new(next_internal));
                next_internal += 1;
            }
        }

        let mut nodes = self.nodes.clone();
        for node in &mut nodes {
            node.parent = None;
            node.clear_children();
        }
        for index in 0..n {
            let source = NodeRef::new(index);
            let target = map[index];
            nodes[target.index()].height = donor.node_height(source);
            for i in 0..donor.child_count(source) {
                let Some(child) = donor.child(source, i) else {
                    continue;
                };
                let child = map[child.index()];
                if !nodes[target.index()].link_child(child) {
                    return Err(TreeError::invalid_argument("donor node has more than two children").at(source));
                }
                nodes[child.index()].parent = Some(target);
            }
        }

        self.nodes = nodes;
        self.root = map[donor.root().index()];
        debug!(tree = %self.id, root = self.root.index(), "adopted donor tree");
        self.push_tree_changed_event(TreeChangedEvent::WholeTree)
    }

    /// Rebuilds topology and heights from the flat encoding.
    ///
    /// Node `i < external_node_count` of the encoding is the tip carrying
    /// `taxa_names[i]`; internal node `i` of the encoding is internal node `i`
    /// here. Queues a [TreeChangedEvent::WholeTree]. Nothing changes on error.
    ///
    /// # Errors
    /// - `SizeMismatch` if an array length does not fit this tree
    /// - `MissingTaxon` for unknown taxa names
    /// - `InvalidTree` for malformed edges (out of range, self loops, tip parents,
    ///   more than two children, zero or several roots)
    pub fn adopt_tree_structure_flat(&mut self, structure: &TreeStructure) -> Result<(), TreeError> {
        self.check_mutable("adopt_tree_structure_flat")?;
        let n = self.nodes.len();
        let ext = self.external_count;
        structure.check_sizes(n, ext)?;

        let mut map: Vec<NodeRef> = (0..n).map(NodeRef::new).collect();
        let mut used = vec![false; ext];
        for (i, name) in structure.taxa_names.iter().enumerate() {
            let tip = self.taxon_index(name).ok_or_else(|| TreeError::missing_taxon(name.as_str()))?;
            if std::mem::replace(&mut used[tip], true) {
                return Err(TreeError::invalid_argument(format!("taxon '{}' appears twice", name)));
            }
            map[i] = NodeRef::new(tip);
        }
        let mut external_index = vec![0; n];
        for (i, node) in map.iter().enumerate() {
            external_index[node.index()] = i;
        }

        let mut nodes = self.nodes.clone();
        for node in &mut nodes {
            node.parent = None;
            node.clear_children();
        }
        let mut root = None;
        for (i, edge) in structure.edges.iter().enumerate() {
            let target = map[i];
            nodes[target.index()].height = structure.node_heights[i];
            match *edge {
                None => {
                    if root.replace(target).is_some() {
                        return Err(TreeError::invalid_tree("edges contain more than one root"));
                    }
                }
                Some(parent) => {
                    if parent >= n || parent == i {
                        return Err(TreeError::invalid_tree(format!("malformed edge {} -> {}", i, parent)));
                    }
                    if parent < ext {
                        return Err(TreeError::invalid_tree(format!("edge {} -> {} has a tip as parent", i, parent)));
                    }
                    let parent = map[parent];
                    if !nodes[parent.index()].link_child(target) {
                        return Err(TreeError::invalid_tree("node has more than two children").at(parent));
                    }
                    nodes[target.index()].parent = Some(parent);
                }
            }
        }
        let root = root.ok_or_else(|| TreeError::invalid_tree("edges contain no root"))?;

        // Children were linked in encoding order; apply the requested order
        for node in &mut nodes {
            if let Some((left, right)) = node.children() {
                let order = |c: NodeRef| structure.child_order[external_index[c.index()]];
                if order(left) > order(right) {
                    node.swap_children();
                }
            }
        }

        self.nodes = nodes;
        self.root = root;
        debug!(tree = %self.id, root = root.index(), "adopted flat tree structure");
        self.push_tree_changed_event(TreeChangedEvent::WholeTree)
    }

    /// Exports topology, heights, child order and taxa in the flat encoding.
    pub fn export_tree_structure(&self) -> TreeStructure {
        let edges = self.nodes.iter().map(|node| node.parent.map(NodeRef::index)).collect();
        let node_heights = self.nodes.iter().map(|node| node.height).collect();
        let child_order = (0..self.nodes.len())
            .map(|index| {
                let this = NodeRef::new(index);
                match self[this].parent {
                    Some(parent) if self[parent].right == Some(this) => 1,
                    _ => 0,
                }
            })
            .collect();
        let taxa_names = self.taxa.iter().map(|taxon| taxon.id().to_string()).collect();

        TreeStructure {
            edges,
            node_heights,
            child_order,
            taxa_names,
        }
    }
}

// ============================================================================
// Checkpoints
// ============================================================================
impl ModelState for TreeModel {
    /// Copies the node records into the checkpoint.
    ///
    /// # Errors
    /// `InvalidState` during an edit transaction.
    fn store_state(&mut self) -> Result<(), TreeError> {
        if self.state == EditState::Editing {
            return Err(TreeError::invalid_state("store_state during an edit transaction"));
        }
        self.stored_nodes.clone_from(&self.nodes);
        self.stored_root = self.root;
        self.stored_taxa = None;
        self.has_checkpoint = true;
        debug!(tree = %self.id, "store state");
        Ok(())
    }

    /// Swaps the checkpoint back in. An open transaction is abandoned and
    /// its queued events are dropped.
    ///
    /// # Errors
    /// `InvalidState` without a prior `store_state`.
    fn restore_state(&mut self) -> Result<(), TreeError> {
        if !self.has_checkpoint {
            return Err(TreeError::invalid_state("restore_state without prior store_state"));
        }
        if self.state == EditState::Editing {
            debug!(tree = %self.id, discarded = self.pending.len(), "abandon edit");
            self.pending.clear();
            self.state = EditState::Idle;
        }
        std::mem::swap(&mut self.nodes, &mut self.stored_nodes);
        self.root = self.stored_root;
        if let Some(taxa) = self.stored_taxa.take() {
            self.taxa = taxa;
        }
        self.has_checkpoint = false;
        debug!(tree = %self.id, "restore state");
        Ok(())
    }

    fn accept_state(&mut self) {
        self.has_checkpoint = false;
        self.stored_taxa = None;
        debug!(tree = %self.id, "accept state");
    }
}
