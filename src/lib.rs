//! Timetree is a library for the mutable, time-calibrated tree at the heart
//! of Bayesian phylogenetic MCMC samplers.
//!
//! A proposal kernel changes a [TreeModel] inside an edit transaction; the
//! tree validates itself on commit and tells every dependent model what
//! changed; the sampler checkpoints before the proposal and restores on
//! rejection. Core functionality provided:
//! - Tree model: Strictly binary rooted tree in an arena, tips first, node
//!   heights and optional rates stored per node.
//! - Edit transactions: `begin_edit` / `end_edit`, mutators rejected
//!   outside a transaction, validation of structure and height bounds on
//!   commit.
//! - Change events: Queued during a transaction and delivered in order to
//!   every registered [TreeListener](model::TreeListener).
//! - Checkpoints: `store_state` / `restore_state` / `accept_state` through
//!   the [ModelState](model::ModelState) trait.
//! - Per-node parameters: [TreeParameterModel](model::TreeParameterModel)
//!   keeps a dense vector aligned with the node numbering, also when the
//!   root moves.
//! - Newick: Reading input trees and writing any [Tree](model::Tree).
//!
//! Limitations:
//! - Single-threaded; listeners are `Rc<RefCell<_>>`
//! - Only one open transaction at a time, no nesting
//!
//! # Example
//! ```
//! use timetree::{TreeModel, TreeModelConfig};
//! use timetree::model::{ModelState, Tree};
//!
//! let config = TreeModelConfig::new("birds");
//! let mut tree = TreeModel::from_newick("((Kea:1,Kaka:1):1,Kakapo:2);", config).unwrap();
//! let parrots = tree.internal_node(0).unwrap();
//!
//! // Accepted proposal
//! tree.store_state().unwrap();
//! tree.begin_edit().unwrap();
//! tree.set_node_height(parrots, 1.5).unwrap();
//! tree.end_edit().unwrap();
//! tree.accept_state();
//!
//! // Rejected proposal
//! tree.store_state().unwrap();
//! tree.begin_edit().unwrap();
//! tree.set_node_height(parrots, 0.5).unwrap();
//! tree.end_edit().unwrap();
//! tree.restore_state().unwrap();
//!
//! assert_eq!(tree.node_height(parrots), 1.5);
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod newick;
pub mod parser;

pub use crate::config::TreeModelConfig;
pub use crate::error::{TreeError, TreeErrorType};
pub use crate::model::TreeModel;
pub use crate::newick::{parse_str as parse_newick_str, to_newick};
