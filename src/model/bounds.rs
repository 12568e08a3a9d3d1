//! Height bounds.
//!
//! Bounds of node heights are never stored; they are derived from the
//! current tree every time they are asked for:
//! - upper bound: height of the parent, `+inf` for the root
//! - lower bound: highest child height, `0.0` for a tip

use crate::model::tree::max_child_height;
use crate::model::{NodeRef, Tree};

/// Tolerance used when checking heights against their bounds.
///
/// A height violates its bounds only if it lies strictly outside
/// `[lower - epsilon, upper + epsilon]`.
pub const BOUNDS_EPSILON: f64 = 0.0;

// =#========================================================================#=
// BOUNDS (Trait)
// =#========================================================================#=
/// Legal interval of each dimension of a multi-dimensional variable.
pub trait Bounds {
    /// Returns the number of bounded dimensions.
    fn dimension(&self) -> usize;

    /// Returns the lower bound of dimension `i`.
    fn lower(&self, i: usize) -> f64;

    /// Returns the upper bound of dimension `i`.
    fn upper(&self, i: usize) -> f64;

    /// Returns `true` if `value` lies within the bounds of dimension `i`, allowing `epsilon` slack.
    fn is_within(&self, i: usize, value: f64, epsilon: f64) -> bool {
        value >= self.lower(i) - epsilon && value <= self.upper(i) + epsilon
    }
}

/// Fixed per-dimension intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl DefaultBounds {
    /// Same interval `[lower, upper]` for all `dimension` dimensions.
    pub fn uniform(dimension: usize, lower: f64, upper: f64) -> Self {
        DefaultBounds {
            lower: vec![lower; dimension],
            upper: vec![upper; dimension],
        }
    }

    /// Unbounded in every dimension.
    pub fn unbounded(dimension: usize) -> Self {
        Self::uniform(dimension, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Adds a dimension with interval `[lower, upper]`.
    pub fn push(&mut self, lower: f64, upper: f64) {
        self.lower.push(lower);
        self.upper.push(upper);
    }
}

impl Bounds for DefaultBounds {
    fn dimension(&self) -> usize {
        self.lower.len()
    }

    fn lower(&self, i: usize) -> f64 {
        self.lower[i]
    }

    fn upper(&self, i: usize) -> f64 {
        self.upper[i]
    }
}

// =#========================================================================#=
// NODE HEIGHT BOUNDS
// =#========================================================================#=
/// Lower bound of the height of `node`: highest child height, `0.0` for a tip.
pub fn lower_height_bound<T: Tree + ?Sized>(tree: &T, node: NodeRef) -> f64 {
    max_child_height(tree, node).unwrap_or(0.0)
}

/// Upper bound of the height of `node`: parent height, `+inf` for the root.
pub fn upper_height_bound<T: Tree + ?Sized>(tree: &T, node: NodeRef) -> f64 {
    match tree.parent(node) {
        Some(parent) => tree.node_height(parent),
        None => f64::INFINITY,
    }
}

/// Height bounds of a set of nodes, recomputed from the tree on every query.
///
/// Dimension `i` is the height of the `i`-th node of the set.
pub struct NodeHeightBounds<'a, T: Tree + ?Sized> {
    tree: &'a T,
    nodes: Vec<NodeRef>,
}

impl<'a, T: Tree + ?Sized> NodeHeightBounds<'a, T> {
    /// Bounds of all nodes, dimension `i` being node `i`.
    pub fn new(tree: &'a T) -> Self {
        let nodes = (0..tree.node_count()).map(NodeRef::new).collect();
        NodeHeightBounds { tree, nodes }
    }

    /// Bounds of the given nodes, in the given order.
    pub fn for_nodes(tree: &'a T, nodes: Vec<NodeRef>) -> Self {
        NodeHeightBounds { tree, nodes }
    }

    /// Returns the first node whose height violates its bounds, if any.
    pub fn first_violation(&self, epsilon: f64) -> Option<NodeRef> {
        self.nodes
            .iter()
            .enumerate()
            .find(|&(i, &node)| !self.is_within(i, self.tree.node_height(node), epsilon))
            .map(|(_, &node)| node)
    }
}

impl<T: Tree + ?Sized> Bounds for NodeHeightBounds<'_, T> {
    fn dimension(&self) -> usize {
        self.nodes.len()
    }

    fn lower(&self, i: usize) -> f64 {
        lower_height_bound(self.tree, self.nodes[i])
    }

    fn upper(&self, i: usize) -> f64 {
        upper_height_bound(self.tree, self.nodes[i])
    }
}
