//! Decorator applying a transform to the node heights of another tree.

use crate::model::{NodeRef, Taxon, Tree};

/// Read-only view of `tree` with every node height passed through `transform`.
///
/// Topology and taxa are those of the wrapped tree; branch lengths follow
/// from the transformed heights.
///
/// # Example
/// ```
/// use timetree::TreeModel;
/// use timetree::model::{TransformedTree, Tree};
///
/// let tree = TreeModel::from_newick("(A:1,B:1);", Default::default()).unwrap();
/// let scaled = TransformedTree::scaled(&tree, 10.0);
/// assert_eq!(scaled.node_height(scaled.root()), 10.0);
/// assert_eq!(scaled.branch_length(tree.external_node(0).unwrap()), 10.0);
/// ```
pub struct TransformedTree<'a, T: Tree + ?Sized, F: Fn(f64) -> f64> {
    tree: &'a T,
    transform: F,
}

impl<'a, T: Tree + ?Sized, F: Fn(f64) -> f64> TransformedTree<'a, T, F> {
    /// Wraps `tree`, transforming heights with `transform`.
    pub fn new(tree: &'a T, transform: F) -> Self {
        TransformedTree { tree, transform }
    }

    /// Returns the wrapped tree.
    pub fn inner(&self) -> &'a T {
        self.tree
    }
}

impl<'a, T: Tree + ?Sized> TransformedTree<'a, T, Box<dyn Fn(f64) -> f64>> {
    /// Wraps `tree`, multiplying heights by `factor`.
    pub fn scaled(tree: &'a T, factor: f64) -> Self {
        TransformedTree::new(tree, Box::new(move |height| height * factor))
    }
}

impl<T: Tree + ?Sized, F: Fn(f64) -> f64> Tree for TransformedTree<'_, T, F> {
    fn root(&self) -> NodeRef {
        self.tree.root()
    }

    fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    fn external_node_count(&self) -> usize {
        self.tree.external_node_count()
    }

    fn child_count(&self, node: NodeRef) -> usize {
        self.tree.child_count(node)
    }

    fn child(&self, node: NodeRef, i: usize) -> Option<NodeRef> {
        self.tree.child(node, i)
    }

    fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.tree.parent(node)
    }

    fn node_height(&self, node: NodeRef) -> f64 {
        (self.transform)(self.tree.node_height(node))
    }

    fn taxon(&self, node: NodeRef) -> Option<&Taxon> {
        self.tree.taxon(node)
    }

    fn is_external(&self, node: NodeRef) -> bool {
        self.tree.is_external(node)
    }
}
