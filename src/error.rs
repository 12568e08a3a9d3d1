//! Error types for the tree model.
//!
//! This module provides [TreeError] and [TreeErrorType] for reporting misuse of
//! the edit protocol, invalid trees and failed lookups.
//! Errors are split by who has to react to them:
//! - **State errors** ([TreeErrorType::InvalidState]) are caller bugs, e.g.
//!   mutating outside an edit transaction.
//! - **Invalid trees** ([TreeErrorType::InvalidTree]) are expected during MCMC;
//!   the driver rejects the proposal and restores the last checkpoint.
//! - **Argument errors** ([TreeErrorType::InvalidArgument],
//!   [TreeErrorType::SizeMismatch], [TreeErrorType::MissingTaxon]) report bad input.

use crate::model::NodeRef;
use crate::parser::ParsingError;
use thiserror::Error;

// =#========================================================================#=
// TREE ERROR TYPE
// =#========================================================================#=
/// Kinds of errors raised by the tree model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeErrorType {
    /// Operation not legal in the current state (e.g. mutation outside an edit transaction).
    #[error("Invalid state - {0}")]
    InvalidState(String),

    /// Tree violates a structural or height invariant.
    #[error("Invalid tree - {0}")]
    InvalidTree(String),

    /// Argument not acceptable for this tree.
    #[error("Invalid argument - {0}")]
    InvalidArgument(String),

    /// Array lengths of a bulk operation do not fit the tree.
    #[error("Size mismatch - {what}: expected {expected} but got {found}")]
    SizeMismatch {
        /// What was measured
        what: &'static str,
        /// Length required by the tree
        expected: usize,
        /// Length provided
        found: usize,
    },

    /// A taxon could not be mapped onto a tip of the tree.
    #[error("Missing taxon - {0}")]
    MissingTaxon(String),

    /// Tree input could not be parsed.
    #[error("Parsing failed - {0}")]
    Parsing(ParsingError),
}

// =#========================================================================#=
// TREE ERROR
// =#========================================================================#=
/// Tree model error, optionally tied to the node that caused it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}{}", node_suffix(.node))]
pub struct TreeError {
    kind: TreeErrorType,
    node: Option<NodeRef>,
}

fn node_suffix(node: &Option<NodeRef>) -> String {
    match node {
        Some(node) => format!(" (at node {})", node.index()),
        None => String::new(),
    }
}

impl TreeError {
    /// Creates an error of the given kind without node information.
    pub fn new(kind: TreeErrorType) -> Self {
        Self { kind, node: None }
    }

    /// Attaches the node that caused this error.
    pub fn at(mut self, node: NodeRef) -> Self {
        self.node = Some(node);
        self
    }

    /// Convenience constructor for InvalidState
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(TreeErrorType::InvalidState(msg.into()))
    }

    /// Convenience constructor for InvalidTree
    pub fn invalid_tree(msg: impl Into<String>) -> Self {
        Self::new(TreeErrorType::InvalidTree(msg.into()))
    }

    /// Convenience constructor for InvalidArgument
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(TreeErrorType::InvalidArgument(msg.into()))
    }

    /// Convenience constructor for SizeMismatch
    pub fn size_mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        Self::new(TreeErrorType::SizeMismatch { what, expected, found })
    }

    /// Convenience constructor for MissingTaxon
    pub fn missing_taxon(taxon_id: impl Into<String>) -> Self {
        Self::new(TreeErrorType::MissingTaxon(taxon_id.into()))
    }

    /// Get the error kind
    pub fn kind(&self) -> &TreeErrorType {
        &self.kind
    }

    /// Get the node the error refers to, if known
    pub fn node(&self) -> Option<NodeRef> {
        self.node
    }

    /// Returns `true` for errors signalling an invalid (rejectable) tree.
    pub fn is_invalid_tree(&self) -> bool {
        matches!(self.kind, TreeErrorType::InvalidTree(_))
    }

    /// Returns `true` for errors signalling misuse of the edit protocol.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self.kind, TreeErrorType::InvalidState(_))
    }
}

impl From<ParsingError> for TreeError {
    fn from(err: ParsingError) -> Self {
        Self::new(TreeErrorType::Parsing(err))
    }
}
