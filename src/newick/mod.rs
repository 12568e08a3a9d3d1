//! Newick input and output.
//!
//! Reading produces [FlexibleTree]s (the input format of
//! [TreeModel](crate::TreeModel)); writing is a read-only projection of any
//! [Tree](crate::model::Tree).
//!
//! # Quick API
//! * [`parse_str`] - parses the first tree of a string
//! * [`parse_all`] - parses every tree of a string
//! * [`parse_file`] - parses every tree of a file
//! * [`to_newick`] - writes a tree
//!
//! # Format
//! * `tree ::= node ';'`
//! * `node ::= '(' node (',' node)* ')' [label] [branch_length] | label [branch_length]`
//! * `branch_length ::= ':' number`
//!
//! Furthermore:
//! * Whitespace can occur between elements, just not within an unquoted
//!   label or a branch length
//! * Labels in single quotes may contain any character, `''` standing for `'`
//! * Comments are square brackets and can occur wherever whitespace can;
//!   annotations such as `[&rate=0.5]` are treated as comments
//! * Internal node labels are read and dropped
//! * Missing branch lengths count as 0

mod defs;
mod reader;
mod writer;

pub use self::reader::NewickReader;
pub use self::writer::{NewickStyle, to_newick, to_newick_with_style, write_newick};

use crate::model::FlexibleTree;
use crate::parser::{ByteParser, ParsingError};
use std::path::Path;

/// Parses the first Newick tree of `newick`.
///
/// # Errors
/// [ParsingError] if the input holds no tree or the first tree is malformed.
///
/// # Example
/// ```
/// use timetree::newick::parse_str;
/// use timetree::model::Tree;
///
/// let tree = parse_str("((Huia:1.5,Saddleback:1.5):1,Kokako:2.5);").unwrap();
/// assert_eq!(tree.external_node_count(), 3);
/// assert_eq!(tree.node_height(tree.root()), 2.5);
/// ```
pub fn parse_str<S: AsRef<str>>(newick: S) -> Result<FlexibleTree, ParsingError> {
    NewickReader::for_str(newick.as_ref()).read_tree()
}

/// Parses all `;`-terminated Newick trees of `newick`.
pub fn parse_all<S: AsRef<str>>(newick: S) -> Result<Vec<FlexibleTree>, ParsingError> {
    NewickReader::for_str(newick.as_ref()).read_all()
}

/// Parses all Newick trees of the file at `path`.
///
/// # Errors
/// [ParsingError] if the file cannot be read or holds malformed Newick.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<FlexibleTree>, ParsingError> {
    let bytes = std::fs::read(path)?;
    NewickReader::new(ByteParser::from_bytes(&bytes)).read_all()
}
