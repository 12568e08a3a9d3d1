//! Change events fired by a [TreeModel](crate::model::TreeModel).
//!
//! Events are queued during an edit transaction and delivered in the order
//! they were produced when the transaction commits. They are never coalesced:
//! a [TreeChangedEvent::WholeTree] does not void the events queued before it.

use crate::model::NodeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

// =#========================================================================#=
// PARAMETER KIND / INDEX
// =#========================================================================#=
/// Per-node state cell that a [TreeChangedEvent::NodeParameterChanged] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Node height (time coordinate, larger is older)
    Height,
    /// Node rate
    Rate,
}

/// Coordinate of a parameter that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterIndex {
    /// A single coordinate changed
    Dimension(usize),
    /// All coordinates of the parameter changed
    All,
}

impl ParameterIndex {
    /// Returns the changed coordinate, `None` if all coordinates changed.
    pub fn dimension(self) -> Option<usize> {
        match self {
            ParameterIndex::Dimension(i) => Some(i),
            ParameterIndex::All => None,
        }
    }
}

/// How the value(s) of a variable changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    /// One value changed
    ValueChanged,
    /// Every value changed
    AllValuesChanged,
}

impl ChangeType {
    /// The change type implied by a changed parameter coordinate.
    pub fn for_index(index: ParameterIndex) -> Self {
        match index {
            ParameterIndex::Dimension(_) => ChangeType::ValueChanged,
            ParameterIndex::All => ChangeType::AllValuesChanged,
        }
    }
}

// =#========================================================================#=
// TREE CHANGED EVENT
// =#========================================================================#=
/// What changed in a tree.
///
/// Listeners pick the cheapest update that is still correct for each shape:
/// recompute everything on `WholeTree`, the partials above a node on
/// `NodeChanged`, and so on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeChangedEvent {
    /// Everything may have changed.
    WholeTree,
    /// Topology or connectivity at `node` changed.
    NodeChanged {
        node: NodeRef,
        height_changed: bool,
    },
    /// One coordinate (or all) of a per-node parameter changed.
    NodeParameterChanged {
        node: NodeRef,
        parameter: ParameterKind,
        index: ParameterIndex,
    },
    /// Left and right children of `node` were swapped.
    NodeOrderChanged { node: NodeRef },
}

impl TreeChangedEvent {
    /// Event for a topology change at `node`.
    pub fn node_changed(node: NodeRef) -> Self {
        TreeChangedEvent::NodeChanged {
            node,
            height_changed: false,
        }
    }

    /// Event for a change of `node`'s height parameter.
    pub fn height_changed(node: NodeRef, index: ParameterIndex) -> Self {
        TreeChangedEvent::NodeParameterChanged {
            node,
            parameter: ParameterKind::Height,
            index,
        }
    }

    /// Event for a change of `node`'s rate parameter.
    pub fn rate_changed(node: NodeRef) -> Self {
        TreeChangedEvent::NodeParameterChanged {
            node,
            parameter: ParameterKind::Rate,
            index: ParameterIndex::Dimension(0),
        }
    }

    /// Returns the node this event refers to, `None` for [TreeChangedEvent::WholeTree].
    pub fn node(&self) -> Option<NodeRef> {
        match *self {
            TreeChangedEvent::WholeTree => None,
            TreeChangedEvent::NodeChanged { node, .. }
            | TreeChangedEvent::NodeParameterChanged { node, .. }
            | TreeChangedEvent::NodeOrderChanged { node } => Some(node),
        }
    }

    pub fn is_whole_tree(&self) -> bool {
        matches!(self, TreeChangedEvent::WholeTree)
    }

    pub fn is_node_changed(&self) -> bool {
        matches!(self, TreeChangedEvent::NodeChanged { .. })
    }

    pub fn is_node_parameter_changed(&self) -> bool {
        matches!(self, TreeChangedEvent::NodeParameterChanged { .. })
    }

    pub fn is_node_order_changed(&self) -> bool {
        matches!(self, TreeChangedEvent::NodeOrderChanged { .. })
    }

    /// Returns `true` if this event signals a changed node height.
    pub fn is_height_changed(&self) -> bool {
        match *self {
            TreeChangedEvent::NodeChanged { height_changed, .. } => height_changed,
            TreeChangedEvent::NodeParameterChanged { parameter, .. } => {
                parameter == ParameterKind::Height
            }
            _ => false,
        }
    }
}

impl fmt::Display for TreeChangedEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TreeChangedEvent::WholeTree => write!(f, "whole tree changed"),
            TreeChangedEvent::NodeChanged { node, height_changed } => {
                write!(f, "{} changed", node)?;
                if *height_changed {
                    write!(f, " (height)")?;
                }
                Ok(())
            }
            TreeChangedEvent::NodeParameterChanged { node, parameter, index } => match index {
                ParameterIndex::Dimension(i) => write!(f, "{:?}[{}] of {} changed", parameter, i, node),
                ParameterIndex::All => write!(f, "{:?} of {} changed (all dimensions)", parameter, node),
            },
            TreeChangedEvent::NodeOrderChanged { node } => write!(f, "child order of {} changed", node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_changed_flags() {
        let node = NodeRef::new(4);
        assert!(TreeChangedEvent::height_changed(node, ParameterIndex::All).is_height_changed());
        assert!(!TreeChangedEvent::rate_changed(node).is_height_changed());
        assert!(!TreeChangedEvent::node_changed(node).is_height_changed());
        assert_eq!(TreeChangedEvent::NodeOrderChanged { node }.node(), Some(node));
        assert_eq!(TreeChangedEvent::WholeTree.node(), None);
    }

    #[test]
    fn test_change_type_for_index() {
        assert_eq!(ChangeType::for_index(ParameterIndex::All), ChangeType::AllValuesChanged);
        assert_eq!(ChangeType::for_index(ParameterIndex::Dimension(2)), ChangeType::ValueChanged);
        assert_eq!(ParameterIndex::Dimension(2).dimension(), Some(2));
    }
}
