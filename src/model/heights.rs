//! Node heights as parameters.
//!
//! - [HeightParameter]: Handle of the height cell of one node.
//! - [NodeHeightsParameter]: Flat vector view over a selection of node
//!   heights (root, other internal nodes, tips).
//!
//! Heights live in the tree's node records; these types only map parameter
//! coordinates to nodes, so they never go stale after a restore.

use crate::error::TreeError;
use crate::model::bounds::NodeHeightBounds;
use crate::model::{NodeRef, ParameterIndex, Tree, TreeModel};

// =#========================================================================#=
// HEIGHT PARAMETER
// =#========================================================================#=
/// Handle of the height cell of a single node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeightParameter {
    id: String,
    tree_id: String,
    node: NodeRef,
}

impl HeightParameter {
    pub(crate) fn new(tree_id: &str, node: NodeRef) -> Self {
        HeightParameter {
            id: format!("{}.nodeHeight.{}", tree_id, node.index()),
            tree_id: tree_id.to_string(),
            node,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the id of the tree owning this cell.
    pub fn tree_id(&self) -> &str {
        &self.tree_id
    }

    /// Returns the node whose height this is.
    pub fn node(&self) -> NodeRef {
        self.node
    }
}

// =#========================================================================#=
// NODE HEIGHTS PARAMETER
// =#========================================================================#=
/// Vector view over the heights of selected nodes of a [TreeModel].
///
/// Coordinates map to nodes deterministically for the current tree:
/// internal nodes first in node order (the root only if selected, the other
/// internal nodes only if selected), then the tips if selected. Since the
/// root can move, the mapping is recomputed from the tree on every access.
///
/// Writes go through the tree and queue
/// [NodeParameterChanged](crate::model::TreeChangedEvent::NodeParameterChanged)
/// events carrying the written coordinate, or [ParameterIndex::All] for
/// whole-vector writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHeightsParameter {
    id: String,
    tree_id: String,
    include_root: bool,
    include_internal: bool,
    include_tips: bool,
}

impl NodeHeightsParameter {
    /// Creates the view for `tree`.
    ///
    /// # Errors
    /// `InvalidArgument` if nothing is selected.
    pub fn new(tree: &TreeModel, root: bool, internal: bool, tips: bool) -> Result<Self, TreeError> {
        let name = match (root, internal, tips) {
            (false, false, false) => {
                return Err(TreeError::invalid_argument(
                    "node heights parameter needs at least one of root, internal nodes or tips",
                ));
            }
            (true, false, false) => "rootHeight",
            (false, true, false) => "internalNodeHeights",
            (true, true, false) => "allInternalNodeHeights",
            (false, false, true) => "leafHeights",
            _ => "nodeHeights",
        };
        Ok(NodeHeightsParameter {
            id: format!("{}.{}", tree.id(), name),
            tree_id: tree.id().to_string(),
            include_root: root,
            include_internal: internal,
            include_tips: tips,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the nodes behind the coordinates, in coordinate order.
    pub fn nodes(&self, tree: &TreeModel) -> Vec<NodeRef> {
        let root = tree.root();
        let internal = (tree.external_node_count()..tree.node_count())
            .map(NodeRef::new)
            .filter(|&node| if node == root { self.include_root } else { self.include_internal });
        let tips = (0..tree.external_node_count())
            .map(NodeRef::new)
            .filter(|_| self.include_tips);
        internal.chain(tips).collect()
    }

    /// Returns the number of coordinates.
    pub fn dimension(&self, tree: &TreeModel) -> usize {
        self.nodes(tree).len()
    }

    /// Returns the node behind coordinate `i`, `None` if out of range.
    pub fn node_for_index(&self, tree: &TreeModel, i: usize) -> Option<NodeRef> {
        self.nodes(tree).get(i).copied()
    }

    /// Returns the coordinate of `node`, `None` if `node` is not selected.
    pub fn index_of_node(&self, tree: &TreeModel, node: NodeRef) -> Option<usize> {
        self.nodes(tree).iter().position(|&n| n == node)
    }

    /// Returns the value of coordinate `i`.
    pub fn value(&self, tree: &TreeModel, i: usize) -> Result<f64, TreeError> {
        let node = self.checked_node(tree, i)?;
        Ok(tree.node_height(node))
    }

    /// Returns all values in coordinate order.
    pub fn values(&self, tree: &TreeModel) -> Vec<f64> {
        self.nodes(tree).into_iter().map(|node| tree.node_height(node)).collect()
    }

    /// Returns the bounds of the coordinates, derived from the current tree.
    pub fn bounds<'a>(&self, tree: &'a TreeModel) -> NodeHeightBounds<'a, TreeModel> {
        NodeHeightBounds::for_nodes(tree, self.nodes(tree))
    }

    /// Writes coordinate `i`.
    ///
    /// # Errors
    /// `InvalidState` outside an edit transaction, `InvalidArgument` if `i` is
    /// out of range or the view belongs to another tree.
    pub fn set_value(&self, tree: &mut TreeModel, i: usize, value: f64) -> Result<(), TreeError> {
        let node = self.checked_node(tree, i)?;
        tree.set_node_height_with_index(node, value, ParameterIndex::Dimension(i))
    }

    /// Writes all coordinates.
    ///
    /// # Errors
    /// As [NodeHeightsParameter::set_value], plus `SizeMismatch` if `values`
    /// does not have the view's dimension.
    pub fn set_values(&self, tree: &mut TreeModel, values: &[f64]) -> Result<(), TreeError> {
        self.check_tree(tree)?;
        let nodes = self.nodes(tree);
        if values.len() != nodes.len() {
            return Err(TreeError::size_mismatch("node heights", nodes.len(), values.len()));
        }
        for (&node, &value) in nodes.iter().zip(values) {
            tree.set_node_height_with_index(node, value, ParameterIndex::All)?;
        }
        Ok(())
    }

    fn checked_node(&self, tree: &TreeModel, i: usize) -> Result<NodeRef, TreeError> {
        self.check_tree(tree)?;
        self.node_for_index(tree, i).ok_or_else(|| {
            TreeError::invalid_argument(format!("coordinate {} out of range for '{}'", i, self.id))
        })
    }

    fn check_tree(&self, tree: &TreeModel) -> Result<(), TreeError> {
        if tree.id() != self.tree_id {
            return Err(TreeError::invalid_argument(format!(
                "parameter '{}' does not belong to tree '{}'",
                self.id,
                tree.id()
            )));
        }
        Ok(())
    }
}
