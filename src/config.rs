//! Configuration of a [TreeModel](crate::model::TreeModel).

use crate::model::BOUNDS_EPSILON;
use serde::{Deserialize, Serialize};

/// Default id of a tree model.
pub const DEFAULT_TREE_MODEL_ID: &str = "treeModel";

/// Options fixed at construction of a [TreeModel](crate::model::TreeModel).
///
/// # Example
/// ```
/// use timetree::TreeModelConfig;
///
/// let config = TreeModelConfig::new("startingTree")
///     .with_fix_heights(true)
///     .with_bounds_epsilon(1e-12);
/// assert_eq!(config.id, "startingTree");
/// assert!(config.validate_on_commit);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeModelConfig {
    /// Id used in logs and as prefix of generated parameter ids.
    pub id: String,
    /// Keep the input heights; skip the correction of nodes that are not older than their children.
    pub fix_heights: bool,
    /// The tree is fixed data, not a random variable; pushing change events is an error.
    pub fix_tree: bool,
    /// Validate bounds and structure when an edit transaction is committed.
    pub validate_on_commit: bool,
    /// Tolerance of the height bounds check.
    pub bounds_epsilon: f64,
}

impl Default for TreeModelConfig {
    fn default() -> Self {
        TreeModelConfig {
            id: DEFAULT_TREE_MODEL_ID.to_string(),
            fix_heights: false,
            fix_tree: false,
            validate_on_commit: true,
            bounds_epsilon: BOUNDS_EPSILON,
        }
    }
}

impl TreeModelConfig {
    /// Creates the default configuration with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        TreeModelConfig {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_fix_heights(mut self, fix_heights: bool) -> Self {
        self.fix_heights = fix_heights;
        self
    }

    pub fn with_fix_tree(mut self, fix_tree: bool) -> Self {
        self.fix_tree = fix_tree;
        self
    }

    pub fn with_validate_on_commit(mut self, validate: bool) -> Self {
        self.validate_on_commit = validate;
        self
    }

    pub fn with_bounds_epsilon(mut self, epsilon: f64) -> Self {
        self.bounds_epsilon = epsilon;
        self
    }
}
