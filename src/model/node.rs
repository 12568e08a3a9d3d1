//! Node module for the mutable tree model.

use serde::{Deserialize, Serialize};
use std::fmt;

// =#========================================================================#=
// NODE REF
// =#========================================================================#=
/// Opaque handle to a node of a [TreeModel](crate::model::TreeModel).
///
/// Wraps the node's index in the arena, which doubles as its number for
/// parameter lookups. Tips occupy `[0, external_node_count)`, internal
/// nodes (root included) the remaining indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef(usize);

impl NodeRef {
    /// Creates a handle for the node with the given index.
    pub const fn new(index: usize) -> Self {
        NodeRef(index)
    }

    /// Returns the index (number) of the referenced node.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

// =#========================================================================#=
// NODE
// =#========================================================================#=
/// Link record of one node in the tree arena.
///
/// Carries the node's own state cells (height and rate) directly instead of
/// pointing at separate parameter objects, so copying the arena copies the
/// full state of the tree.
///
/// # Invariants (outside of an edit transaction)
/// - A node has either zero (tip) or two (internal) children
/// - `parent` is `None` exactly for the root
/// - Child links and parent links mirror each other
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub(crate) parent: Option<NodeRef>,
    pub(crate) left: Option<NodeRef>,
    pub(crate) right: Option<NodeRef>,
    pub(crate) height: f64,
    pub(crate) rate: f64,
}

impl Node {
    /// Creates an unlinked node at the given height with unit rate.
    pub fn new(height: f64) -> Self {
        Node {
            parent: None,
            left: None,
            right: None,
            height,
            rate: 1.0,
        }
    }

    /// Returns the parent, or `None` for the root (or a detached node during an edit).
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent
    }

    /// Returns the height of this node.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the rate of this node.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns the number of children currently linked (0, 1 or 2).
    pub fn child_count(&self) -> usize {
        self.left.is_some() as usize + self.right.is_some() as usize
    }

    /// Returns the `i`-th child, `0` being the left and `1` the right child.
    pub fn child(&self, i: usize) -> Option<NodeRef> {
        match i {
            0 => self.left,
            1 => self.right,
            _ => None,
        }
    }

    /// Returns both children if this node has two.
    pub fn children(&self) -> Option<(NodeRef, NodeRef)> {
        match (self.left, self.right) {
            (Some(left), Some(right)) => Some((left, right)),
            _ => None,
        }
    }

    /// Returns `true` if `node` is a child of this node.
    pub fn has_child(&self, node: NodeRef) -> bool {
        self.left == Some(node) || self.right == Some(node)
    }

    /// Returns `true` if this node has no children.
    pub fn is_external(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Links `child` into the first free child slot.
    ///
    /// Returns `false` if both slots are taken. Does not touch the child's parent link.
    pub(crate) fn link_child(&mut self, child: NodeRef) -> bool {
        if self.left.is_none() {
            self.left = Some(child);
        } else if self.right.is_none() {
            self.right = Some(child);
        } else {
            return false;
        }
        true
    }

    /// Unlinks `child` from its slot.
    ///
    /// Returns `false` if `child` is not a child of this node.
    pub(crate) fn unlink_child(&mut self, child: NodeRef) -> bool {
        if self.left == Some(child) {
            self.left = None;
        } else if self.right == Some(child) {
            self.right = None;
        } else {
            return false;
        }
        true
    }

    /// Clears both child slots.
    pub(crate) fn clear_children(&mut self) {
        self.left = None;
        self.right = None;
    }

    /// Swaps the left and right child slots.
    pub(crate) fn swap_children(&mut self) {
        std::mem::swap(&mut self.left, &mut self.right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_and_unlink() {
        let mut node = Node::new(2.0);
        assert!(node.is_external());
        assert!(node.link_child(NodeRef::new(0)));
        assert!(node.link_child(NodeRef::new(1)));
        assert!(!node.link_child(NodeRef::new(2)));
        assert_eq!(node.children(), Some((NodeRef::new(0), NodeRef::new(1))));

        assert!(node.unlink_child(NodeRef::new(0)));
        assert!(!node.unlink_child(NodeRef::new(0)));
        assert_eq!(node.child_count(), 1);
        assert_eq!(node.child(0), None);
        assert_eq!(node.child(1), Some(NodeRef::new(1)));

        // Freed left slot is reused first
        assert!(node.link_child(NodeRef::new(5)));
        assert_eq!(node.child(0), Some(NodeRef::new(5)));
    }

    #[test]
    fn test_swap_children() {
        let mut node = Node::new(1.0);
        node.link_child(NodeRef::new(3));
        node.link_child(NodeRef::new(4));
        node.swap_children();
        assert_eq!(node.children(), Some((NodeRef::new(4), NodeRef::new(3))));
    }
}
