//! Tree model and the types around it.
//!
//! - [TreeModel]: The mutable binary tree with edit transactions,
//!   change events and checkpoints.
//! - [Tree]: Read-only query interface, implemented by [TreeModel],
//!   [FlexibleTree] and [TransformedTree].
//! - [FlexibleTree]: Arbitrary input tree, resolved into a binary tree when
//!   a [TreeModel] is built from it.
//! - [TreeParameterModel]: Dense per-node values that follow the node
//!   numbering of a [TreeModel] across root moves.
//! - Node heights as parameters ([HeightParameter], [NodeHeightsParameter])
//!   and their [Bounds].
//!
//! Nodes are referred to by [NodeRef] handles (arena indices), never by
//! references, so the tree can be copied and swapped wholesale on
//! store / restore.

/// Arena node record and handle
pub mod node;
/// Taxa and the taxon-to-tip mapping
pub mod taxon;
/// Read-only tree interface and traversals
pub mod tree;
/// Multifurcating input tree
pub mod flexible_tree;
/// Height correction policies
pub mod perturbation;
/// Parameter bounds and node-height bounds
pub mod bounds;
/// Dense observable parameter
pub mod parameter;
/// Tree change events
pub mod event;
/// Listener and checkpoint traits
pub mod listener;
/// The mutable tree model
pub mod tree_model;
/// Node heights as parameters
pub mod heights;
/// Flat tree encoding
pub mod structure;
/// Per-node parameter synchronised with the tree
pub mod tree_parameter_model;
/// Height-transforming tree view
pub mod transformed_tree;

pub use bounds::{BOUNDS_EPSILON, Bounds, DefaultBounds, NodeHeightBounds};
pub use event::{ChangeType, ParameterIndex, ParameterKind, TreeChangedEvent};
pub use flexible_tree::{FlexibleNode, FlexibleTree};
pub use heights::{HeightParameter, NodeHeightsParameter};
pub use listener::{ListenerRegistry, ModelState, TreeListener};
pub use node::{Node, NodeRef};
pub use parameter::Parameter;
pub use perturbation::{HeightPerturbation, SeededJitter};
pub use structure::TreeStructure;
pub use taxon::{Taxon, TaxonList};
pub use transformed_tree::TransformedTree;
pub use tree::{PostOrderIter, PreOrderIter, Tree};
pub use tree_model::{EditState, TreeModel};
pub use tree_parameter_model::TreeParameterModel;
