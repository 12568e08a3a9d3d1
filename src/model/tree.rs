//! Read-only tree interface.
//!
//! [Tree] is the stable query contract consumed by likelihoods, priors and
//! loggers. It is implemented by the mutable [TreeModel](crate::model::TreeModel),
//! by the input [FlexibleTree](crate::model::FlexibleTree) and by the
//! [TransformedTree](crate::model::TransformedTree) decorator.
//!
//! Traversals ([PostOrderIter], [PreOrderIter]) are stack based and work for
//! any implementor, including multifurcating trees.

use crate::model::{NodeRef, Taxon};

// =#========================================================================#=
// TREE (Trait)
// =#========================================================================#=
/// Read access to a rooted tree whose nodes carry heights.
///
/// Node handles passed to these methods must belong to the tree; out of
/// range handles panic like slice indexing does.
pub trait Tree {
    /// Returns the root node.
    fn root(&self) -> NodeRef;

    /// Returns the total number of nodes.
    fn node_count(&self) -> usize;

    /// Returns the number of tips.
    fn external_node_count(&self) -> usize;

    /// Returns the number of internal nodes, root included.
    fn internal_node_count(&self) -> usize {
        self.node_count() - self.external_node_count()
    }

    /// Returns the number of children of `node`.
    fn child_count(&self, node: NodeRef) -> usize;

    /// Returns the `i`-th child of `node`, `None` if there is no such child.
    fn child(&self, node: NodeRef, i: usize) -> Option<NodeRef>;

    /// Returns the parent of `node`, `None` for the root.
    fn parent(&self, node: NodeRef) -> Option<NodeRef>;

    /// Returns the height of `node`.
    fn node_height(&self, node: NodeRef) -> f64;

    /// Returns the taxon of `node`, `None` for internal nodes.
    fn taxon(&self, node: NodeRef) -> Option<&Taxon>;

    /// Returns `true` if `node` is a tip.
    fn is_external(&self, node: NodeRef) -> bool {
        self.child_count(node) == 0
    }

    /// Returns `true` if `node` is the root.
    fn is_root(&self, node: NodeRef) -> bool {
        self.root() == node
    }

    /// Returns the length of the branch above `node`,
    /// i.e. parent height minus node height (0 for the root).
    fn branch_length(&self, node: NodeRef) -> f64 {
        match self.parent(node) {
            Some(parent) => self.node_height(parent) - self.node_height(node),
            None => 0.0,
        }
    }

    /// Returns an iterator over the nodes in post-order (children before parents).
    fn post_order(&self) -> PostOrderIter<'_, Self>
    where
        Self: Sized,
    {
        PostOrderIter::new(self)
    }

    /// Returns an iterator over the nodes in pre-order (parents before children).
    fn pre_order(&self) -> PreOrderIter<'_, Self>
    where
        Self: Sized,
    {
        PreOrderIter::new(self)
    }
}

/// Returns the highest child height of `node`, `None` for a tip.
pub fn max_child_height<T: Tree + ?Sized>(tree: &T, node: NodeRef) -> Option<f64> {
    (0..tree.child_count(node))
        .filter_map(|i| tree.child(node, i))
        .map(|child| tree.node_height(child))
        .reduce(f64::max)
}

// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
/// Iterator for post-order traversal (children before parents).
///
/// Children are visited left to right; each node is yielded after all of its
/// descendants.
pub struct PostOrderIter<'a, T: Tree + ?Sized> {
    tree: &'a T,
    stack: Vec<(NodeRef, usize)>, // (node, next child to visit)
}

impl<'a, T: Tree + ?Sized> PostOrderIter<'a, T> {
    /// Creates a post-order iterator starting at the root of `tree`.
    pub fn new(tree: &'a T) -> Self {
        Self::from_node(tree, tree.root())
    }

    /// Creates a post-order iterator over the subtree below `node`.
    pub fn from_node(tree: &'a T, node: NodeRef) -> Self {
        let mut stack = Vec::with_capacity(tree.node_count().min(64));
        stack.push((node, 0));
        PostOrderIter { tree, stack }
    }
}

impl<T: Tree + ?Sized> Iterator for PostOrderIter<'_, T> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, next_child)) = self.stack.pop() {
            match self.tree.child(node, next_child) {
                Some(child) => {
                    self.stack.push((node, next_child + 1));
                    self.stack.push((child, 0));
                }
                None => return Some(node),
            }
        }
        None
    }
}

/// Iterator for pre-order traversal (parents before children).
///
/// Each node is yielded before any of its descendants, children left to right.
pub struct PreOrderIter<'a, T: Tree + ?Sized> {
    tree: &'a T,
    stack: Vec<NodeRef>,
}

impl<'a, T: Tree + ?Sized> PreOrderIter<'a, T> {
    /// Creates a pre-order iterator starting at the root of `tree`.
    pub fn new(tree: &'a T) -> Self {
        Self::from_node(tree, tree.root())
    }

    /// Creates a pre-order iterator over the subtree below `node`.
    pub fn from_node(tree: &'a T, node: NodeRef) -> Self {
        PreOrderIter {
            tree,
            stack: vec![node],
        }
    }
}

impl<T: Tree + ?Sized> Iterator for PreOrderIter<'_, T> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;

        // Push children right to left, so the left one is visited first
        for i in (0..self.tree.child_count(node)).rev() {
            if let Some(child) = self.tree.child(node, i) {
                self.stack.push(child);
            }
        }

        Some(node)
    }
}
