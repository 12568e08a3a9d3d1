//! Flat encoding of a tree, e.g. for MCMC checkpoint files.

use crate::error::TreeError;
use serde::{Deserialize, Serialize};

/// Topology and heights of a binary tree as parallel arrays.
///
/// - `edges[i]`: parent of node `i`, `None` for the root
/// - `node_heights[i]`: height of node `i`
/// - `child_order[i]`: `0` if node `i` is the left child of its parent, `1` if the right one
/// - `taxa_names[i]`: taxon of tip `i`, for `i < taxa_names.len()`
///
/// Tips are the first `taxa_names.len()` nodes. Their numbering need not
/// match the numbering of the tree the encoding is adopted into; tips are
/// matched by taxon name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeStructure {
    pub edges: Vec<Option<usize>>,
    pub node_heights: Vec<f64>,
    pub child_order: Vec<u8>,
    pub taxa_names: Vec<String>,
}

impl TreeStructure {
    /// Checks the array lengths against a tree with `node_count` nodes and `external_count` tips.
    ///
    /// # Errors
    /// `SizeMismatch` naming the first array of the wrong length.
    pub fn check_sizes(&self, node_count: usize, external_count: usize) -> Result<(), TreeError> {
        let lengths = [
            ("edges", node_count, self.edges.len()),
            ("node heights", node_count, self.node_heights.len()),
            ("child order", node_count, self.child_order.len()),
            ("taxa names", external_count, self.taxa_names.len()),
        ];
        for (what, expected, found) in lengths {
            if expected != found {
                return Err(TreeError::size_mismatch(what, expected, found));
            }
        }
        Ok(())
    }

    /// Returns the number of nodes encoded.
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TreeErrorType;

    #[test]
    fn test_check_sizes() {
        let structure = TreeStructure {
            edges: vec![Some(2), Some(2), None],
            node_heights: vec![0.0, 0.0, 1.0],
            child_order: vec![0, 1],
            taxa_names: vec!["Tui".to_string(), "Bellbird".to_string()],
        };
        assert_eq!(structure.node_count(), 3);
        let err = structure.check_sizes(3, 2).unwrap_err();
        assert_eq!(
            err.kind(),
            &TreeErrorType::SizeMismatch { what: "child order", expected: 3, found: 2 }
        );
        assert!(structure.check_sizes(5, 2).is_err());
    }
}
