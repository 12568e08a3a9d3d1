//! Input tree for building a [TreeModel](crate::model::TreeModel).
//!
//! A [FlexibleTree] can be multifurcating and need not be properly rooted
//! (a root with three children is the usual way to write an unrooted tree).
//! It is built node by node, e.g. by the [Newick reader](crate::newick),
//! and brought into shape with [FlexibleTree::resolve_tree] and
//! [FlexibleTree::correct_heights_for_tips] before a tree model copies it.

use crate::error::TreeError;
use crate::model::perturbation::HeightPerturbation;
use crate::model::tree::max_child_height;
use crate::model::{NodeRef, Taxon, Tree};

/// *During construction only*, handle of the unset root.
const NO_ROOT_SET: NodeRef = NodeRef::new(usize::MAX);

// =#========================================================================#=
// FLEXIBLE NODE
// =#========================================================================#=
/// Node of a [FlexibleTree] with any number of children.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexibleNode {
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
    height: f64,
    length: Option<f64>,
    taxon: Option<Taxon>,
}

impl FlexibleNode {
    fn new(height: f64, taxon: Option<Taxon>) -> Self {
        FlexibleNode {
            parent: None,
            children: Vec::new(),
            height,
            length: None,
            taxon,
        }
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent
    }

    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Length of the branch above this node as given in the input, if any.
    pub fn length(&self) -> Option<f64> {
        self.length
    }

    pub fn taxon(&self) -> Option<&Taxon> {
        self.taxon.as_ref()
    }
}

// =#========================================================================#=
// FLEXIBLE TREE
// =#========================================================================#=
/// An arbitrary rooted tree, stored in an arena of [FlexibleNode]s.
///
/// # Example
/// ```
/// use timetree::model::{FlexibleTree, Tree};
///
/// // ((A,B,C),D) with all tips at height 0
/// let mut tree = FlexibleTree::new();
/// let a = tree.add_tip("A", 0.0);
/// let b = tree.add_tip("B", 0.0);
/// let c = tree.add_tip("C", 0.0);
/// let d = tree.add_tip("D", 0.0);
/// let abc = tree.add_node(1.0);
/// let root = tree.add_node(2.0);
/// for tip in [a, b, c] {
///     tree.add_child(abc, tip).unwrap();
/// }
/// tree.add_child(root, abc).unwrap();
/// tree.add_child(root, d).unwrap();
/// tree.set_root(root).unwrap();
///
/// assert!(!tree.is_binary());
/// tree.resolve_tree();
/// assert!(tree.is_binary());
/// assert_eq!(tree.node_count(), 7);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlexibleTree {
    nodes: Vec<FlexibleNode>,
    root: NodeRef,
    name: Option<String>,
}

impl Default for FlexibleTree {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Construction (pub)
// ============================================================================
impl FlexibleTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        FlexibleTree {
            nodes: Vec::new(),
            root: NO_ROOT_SET,
            name: None,
        }
    }

    /// Creates an empty tree with room for a binary tree on `num_tips` tips.
    pub fn with_capacity(num_tips: usize) -> Self {
        FlexibleTree {
            nodes: Vec::with_capacity((2 * num_tips).saturating_sub(1)),
            root: NO_ROOT_SET,
            name: None,
        }
    }

    /// Attaches a name to this tree.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Adds a tip carrying `taxon` at the given height.
    pub fn add_tip(&mut self, taxon: impl Into<Taxon>, height: f64) -> NodeRef {
        self.push(FlexibleNode::new(height, Some(taxon.into())))
    }

    /// Adds a node without taxon at the given height.
    pub fn add_node(&mut self, height: f64) -> NodeRef {
        self.push(FlexibleNode::new(height, None))
    }

    fn push(&mut self, node: FlexibleNode) -> NodeRef {
        let index = NodeRef::new(self.nodes.len());
        self.nodes.push(node);
        index
    }

    /// Appends `child` to the children of `parent`.
    ///
    /// # Errors
    /// `InvalidArgument` if either node does not exist, `child` already has a
    /// parent or `parent == child`.
    pub fn add_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), TreeError> {
        self.check_node(parent)?;
        self.check_node(child)?;
        if parent == child {
            return Err(TreeError::invalid_argument("node cannot be its own child").at(child));
        }
        if self[child].parent.is_some() {
            return Err(TreeError::invalid_argument("node already has a parent").at(child));
        }
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    /// Makes `node` the root.
    ///
    /// # Errors
    /// `InvalidArgument` if `node` does not exist.
    pub fn set_root(&mut self, node: NodeRef) -> Result<(), TreeError> {
        self.check_node(node)?;
        self.root = node;
        Ok(())
    }

    /// Returns whether the root has been set.
    pub fn is_root_set(&self) -> bool {
        self.root != NO_ROOT_SET
    }

    /// Sets the height of `node`.
    pub fn set_node_height(&mut self, node: NodeRef, height: f64) {
        self.nodes[node.index()].height = height;
    }

    /// Records the length of the branch above `node`.
    pub fn set_branch_length(&mut self, node: NodeRef, length: Option<f64>) {
        self.nodes[node.index()].length = length;
    }

    /// Returns the node record of `node`.
    pub fn node(&self, node: NodeRef) -> &FlexibleNode {
        &self[node]
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

impl std::ops::Index<NodeRef> for FlexibleTree {
    type Output = FlexibleNode;

    fn index(&self, node: NodeRef) -> &Self::Output {
        &self.nodes[node.index()]
    }
}

// ============================================================================
// Heights and shape (pub)
// ============================================================================
impl FlexibleTree {
    /// Derives all node heights from the branch lengths.
    ///
    /// The node furthest from the root gets height 0; every other node gets
    /// the difference of its depth to that maximal depth. Missing branch
    /// lengths count as 0.
    pub fn heights_from_branch_lengths(&mut self) {
        if !self.is_root_set() {
            return;
        }

        let order: Vec<NodeRef> = self.pre_order().collect();
        let mut depths = vec![0.0; self.nodes.len()];
        for &node in &order {
            if let Some(parent) = self[node].parent {
                depths[node.index()] = depths[parent.index()] + self[node].length.unwrap_or(0.0);
            }
        }

        let max_depth = order.iter().map(|n| depths[n.index()]).fold(0.0, f64::max);
        for node in order {
            self.nodes[node.index()].height = max_depth - depths[node.index()];
        }
    }

    /// Returns `true` if every node has zero or two children.
    pub fn is_binary(&self) -> bool {
        self.nodes.iter().all(|n| n.children.is_empty() || n.children.len() == 2)
    }

    /// Forces strict bifurcation and removes unary nodes.
    ///
    /// A node with `k > 2` children gets `k - 2` new nodes at its own height:
    /// its first two children are repeatedly paired under a new node which
    /// takes their place. A non-root node with a single child is spliced out;
    /// a root with a single child hands the root over to that child. The
    /// arena is compacted afterwards, so node handles taken before this call
    /// are invalid.
    ///
    /// # Returns
    /// The number of nodes added minus the number of nodes removed.
    pub fn resolve_tree(&mut self) -> isize {
        if !self.is_root_set() {
            return 0;
        }
        let before = self.nodes.len() as isize;

        // Polytomies, deterministic: always pair the first two children
        let mut i = 0;
        while i < self.nodes.len() {
            while self.nodes[i].children.len() > 2 {
                let height = self.nodes[i].height;
                let first = self.nodes[i].children.remove(0);
                let second = self.nodes[i].children.remove(0);
                let pair = self.add_node(height);
                self.nodes[pair.index()].children = vec![first, second];
                self.nodes[pair.index()].parent = Some(NodeRef::new(i));
                self.nodes[first.index()].parent = Some(pair);
                self.nodes[second.index()].parent = Some(pair);
                self.nodes[i].children.insert(0, pair);
            }
            i += 1;
        }

        // Unary nodes
        for i in 0..self.nodes.len() {
            if self.nodes[i].children.len() != 1 {
                continue;
            }
            let node = NodeRef::new(i);
            let child = self.nodes[i].children[0];
            match self.nodes[i].parent {
                Some(parent) => {
                    let slot = &mut self.nodes[parent.index()].children;
                    if let Some(pos) = slot.iter().position(|&c| c == node) {
                        slot[pos] = child;
                    }
                    let length = self.nodes[i].length;
                    let child_node = &mut self.nodes[child.index()];
                    child_node.parent = Some(parent);
                    child_node.length = match (child_node.length, length) {
                        (Some(a), Some(b)) => Some(a + b),
                        (a, b) => a.or(b),
                    };
                }
                None => {
                    self.nodes[child.index()].parent = None;
                    if self.root == node {
                        self.root = child;
                    }
                }
            }
            self.nodes[i].children.clear();
            self.nodes[i].parent = None;
        }

        self.compact();
        self.nodes.len() as isize - before
    }

    /// Lifts every internal node that is not strictly older than its oldest
    /// child to the height chosen by `policy`, visiting nodes in post-order.
    ///
    /// # Returns
    /// The number of corrected nodes.
    pub fn correct_heights_for_tips<P: HeightPerturbation + ?Sized>(&mut self, policy: &mut P) -> usize {
        if !self.is_root_set() {
            return 0;
        }

        let order: Vec<NodeRef> = self.post_order().collect();
        let mut corrected = 0;
        for node in order {
            if let Some(max_child) = max_child_height(&*self, node) {
                if self[node].height <= max_child {
                    self.nodes[node.index()].height = policy.perturb(max_child);
                    corrected += 1;
                }
            }
        }
        corrected
    }

    /// Drops nodes not reachable from the root and renumbers the rest in pre-order.
    fn compact(&mut self) {
        let order: Vec<NodeRef> = self.pre_order().collect();
        if order.len() == self.nodes.len() {
            return;
        }

        let mut new_index = vec![None; self.nodes.len()];
        for (i, node) in order.iter().enumerate() {
            new_index[node.index()] = Some(NodeRef::new(i));
        }
        let remap = |node: NodeRef| new_index[node.index()];

        let mut nodes = Vec::with_capacity(order.len());
        for node in &order {
            let old = &self.nodes[node.index()];
            nodes.push(FlexibleNode {
                parent: old.parent.and_then(remap),
                children: old.children.iter().filter_map(|&c| remap(c)).collect(),
                height: old.height,
                length: old.length,
                taxon: old.taxon.clone(),
            });
        }
        self.nodes = nodes;
        self.root = NodeRef::new(0);
    }
}

impl Tree for FlexibleTree {
    fn root(&self) -> NodeRef {
        self.root
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn external_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.children.is_empty()).count()
    }

    fn child_count(&self, node: NodeRef) -> usize {
        self[node].children.len()
    }

    fn child(&self, node: NodeRef, i: usize) -> Option<NodeRef> {
        self[node].children.get(i).copied()
    }

    fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self[node].parent
    }

    fn node_height(&self, node: NodeRef) -> f64 {
        self[node].height
    }

    fn taxon(&self, node: NodeRef) -> Option<&Taxon> {
        self[node].taxon.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_with_single_child_is_dropped() {
        let mut tree = FlexibleTree::new();
        let a = tree.add_tip("Kea", 0.0);
        let b = tree.add_tip("Kaka", 0.0);
        let inner = tree.add_node(1.0);
        let root = tree.add_node(2.0);
        tree.add_child(inner, a).unwrap();
        tree.add_child(inner, b).unwrap();
        tree.add_child(root, inner).unwrap();
        tree.set_root(root).unwrap();

        assert_eq!(tree.resolve_tree(), -1);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.node_height(tree.root()), 1.0);
        assert_eq!(tree.parent(tree.root()), None);
    }

    #[test]
    fn test_add_child_twice_fails() {
        let mut tree = FlexibleTree::new();
        let a = tree.add_tip("Takahe", 0.0);
        let p = tree.add_node(1.0);
        let q = tree.add_node(1.0);
        tree.add_child(p, a).unwrap();
        assert!(tree.add_child(q, a).is_err());
        assert!(tree.add_child(p, p).is_err());
    }
}
