//! Taxon module: tip labels and their lookup.
//!
//! - [Taxon]: Identity of an observed tip.
//! - [TaxonList]: Ordered, deduplicated taxa with id-to-index lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =#========================================================================#=
// TAXON
// =#========================================================================#=
/// An observed taxon attached to a tip of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Taxon {
    id: String,
}

impl Taxon {
    /// Creates a taxon with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Taxon { id: id.into() }
    }

    /// Returns the id of this taxon.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Taxon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl From<&str> for Taxon {
    fn from(id: &str) -> Self {
        Taxon::new(id)
    }
}

// =#========================================================================#=
// TAXON LIST
// =#========================================================================#=
/// Maps taxa to compact indices and back.
///
/// Index `i` of the list is the taxon of tip `i` of a [TreeModel](crate::model::TreeModel).
/// Lookups by id return `None` when the taxon is absent; callers that require
/// the taxon report [MissingTaxon](crate::TreeErrorType::MissingTaxon) instead.
///
/// # Example
/// ```
/// use timetree::model::TaxonList;
///
/// let mut taxa = TaxonList::with_capacity(3);
///
/// let idx_a = taxa.get_or_insert("A");  // idx_a = 0
/// let idx_b = taxa.get_or_insert("B");  // idx_b = 1
/// let idx_a2 = taxa.get_or_insert("A"); // idx_a2 = 0 (deduplicated)
///
/// assert_eq!(idx_a, idx_a2);
/// assert_eq!(taxa.get(idx_b).map(|t| t.id()), Some("B"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxonList {
    taxa: Vec<Taxon>,
    map: HashMap<String, usize>,
}

impl TaxonList {
    /// Creates an empty list with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        TaxonList {
            taxa: Vec::with_capacity(capacity),
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Gets the index for a taxon id, inserting it if it doesn't exist.
    pub fn get_or_insert(&mut self, id: &str) -> usize {
        if let Some(&index) = self.map.get(id) {
            return index;
        }
        let index = self.taxa.len();
        self.taxa.push(Taxon::new(id));
        self.map.insert(id.to_string(), index);
        index
    }

    /// Replaces the taxon at `index`, keeping the lookup consistent.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn replace(&mut self, index: usize, taxon: Taxon) {
        let old = std::mem::replace(&mut self.taxa[index], taxon);
        if self.map.get(old.id()) == Some(&index) {
            self.map.remove(old.id());
        }
        self.map.insert(self.taxa[index].id().to_string(), index);
    }

    /// Returns the index of the taxon with the given id, `None` if absent.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.map.get(id).copied()
    }

    /// Returns the taxon at `index`, `None` if out of bounds.
    pub fn get(&self, index: usize) -> Option<&Taxon> {
        self.taxa.get(index)
    }

    /// Checks if a taxon with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.map.contains_key(id)
    }

    /// Returns the number of taxa.
    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    /// Returns `true` if the list holds no taxa.
    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    /// Returns an iterator over the taxa in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Taxon> {
        self.taxa.iter()
    }
}

impl FromIterator<Taxon> for TaxonList {
    fn from_iter<I: IntoIterator<Item = Taxon>>(iter: I) -> Self {
        let mut list = TaxonList::default();
        for taxon in iter {
            let index = list.taxa.len();
            list.map.insert(taxon.id().to_string(), index);
            list.taxa.push(taxon);
        }
        list
    }
}

impl std::ops::Index<usize> for TaxonList {
    type Output = Taxon;

    fn index(&self, index: usize) -> &Self::Output {
        &self.taxa[index]
    }
}

impl fmt::Display for TaxonList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "TaxonList ({} taxa):", self.taxa.len())?;
        for (idx, taxon) in self.taxa.iter().enumerate() {
            writeln!(f, "  [{}] {}", idx, taxon)?;
        }
        Ok(())
    }
}
