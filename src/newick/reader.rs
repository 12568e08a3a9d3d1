//! Reading Newick strings into [FlexibleTree]s.

use crate::model::{FlexibleTree, NodeRef, Taxon, Tree};
use crate::newick::defs::{DEFAULT_NUM_TIPS_GUESS, NEWICK_LABEL_DELIMITERS, is_number_byte};
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::{ByteSource, InMemoryByteSource};
use crate::parser::parsing_error::ParsingError;
use tracing::debug;

// =#========================================================================#=
// NEWICK READER
// =#========================================================================#=
/// Reader of one or more `;`-terminated Newick trees from a byte source.
///
/// Trees may be multifurcating; internal node labels are accepted and
/// dropped. Node heights are derived from the branch lengths, the tip
/// furthest from the root getting height 0.
///
/// # Example
/// ```
/// use timetree::newick::NewickReader;
/// use timetree::model::Tree;
///
/// let mut reader = NewickReader::for_str("(Kiwi:1,Moa:1); ((Kea:1,Kaka:1):1,Kakapo:2);");
/// let trees: Vec<_> = reader.by_ref().collect::<Result<_, _>>().unwrap();
/// assert_eq!(trees.len(), 2);
/// assert_eq!(trees[1].external_node_count(), 3);
/// assert_eq!(trees[1].node_height(trees[1].root()), 2.0);
/// ```
pub struct NewickReader<B: ByteSource> {
    parser: ByteParser<B>,
    num_tips: usize,
    trees_read: usize,
}

impl NewickReader<InMemoryByteSource> {
    /// Creates a reader over a copy of `input`.
    pub fn for_str(input: &str) -> Self {
        Self::new(ByteParser::for_str(input))
    }
}

// ============================================================================
// API Reading (pub)
// ============================================================================
impl<B: ByteSource> NewickReader<B> {
    pub fn new(parser: ByteParser<B>) -> Self {
        Self {
            parser,
            num_tips: DEFAULT_NUM_TIPS_GUESS,
            trees_read: 0,
        }
    }

    /// Returns the number of trees read so far.
    pub fn trees_read(&self) -> usize {
        self.trees_read
    }

    /// Reads the next tree, `Ok(None)` if only whitespace and comments are left.
    pub fn next_tree(&mut self) -> Result<Option<FlexibleTree>, ParsingError> {
        self.parser.skip_comment_and_whitespace()?;
        if self.parser.is_eof() {
            return Ok(None);
        }
        self.parse_tree().map(Some)
    }

    /// Reads the next tree.
    ///
    /// # Errors
    /// `UnexpectedEOF` if only whitespace and comments are left.
    pub fn read_tree(&mut self) -> Result<FlexibleTree, ParsingError> {
        self.next_tree()?
            .ok_or_else(|| ParsingError::unexpected_eof(&self.parser))
    }

    /// Reads all remaining trees.
    pub fn read_all(mut self) -> Result<Vec<FlexibleTree>, ParsingError> {
        let mut trees = Vec::new();
        while let Some(tree) = self.next_tree()? {
            trees.push(tree);
        }
        Ok(trees)
    }
}

impl<B: ByteSource> Iterator for NewickReader<B> {
    type Item = Result<FlexibleTree, ParsingError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_tree().transpose()
    }
}

// ============================================================================
// Parsing
// ============================================================================
impl<B: ByteSource> NewickReader<B> {
    /// Parses `node ';'` and derives the heights.
    fn parse_tree(&mut self) -> Result<FlexibleTree, ParsingError> {
        let mut tree = FlexibleTree::with_capacity(self.num_tips);
        let root = self.parse_node(&mut tree)?;

        self.parser.skip_comment_and_whitespace()?;
        if !self.parser.consume_if(b';') {
            return Err(self.unexpected("';' at end of tree"));
        }

        tree.set_root(root)
            .map_err(|e| ParsingError::invalid_newick_string(&self.parser, e.to_string()))?;
        tree.heights_from_branch_lengths();
        self.num_tips = tree.external_node_count();
        self.trees_read += 1;
        debug!(
            tree = self.trees_read,
            nodes = tree.node_count(),
            tips = self.num_tips,
            "read newick tree"
        );
        Ok(tree)
    }

    /// Parses `'(' node (',' node)* ')' [label] [':' length]` or `label [':' length]`.
    fn parse_node(&mut self, tree: &mut FlexibleTree) -> Result<NodeRef, ParsingError> {
        self.parser.skip_comment_and_whitespace()?;

        let node = if self.parser.consume_if(b'(') {
            let mut children = Vec::with_capacity(2);
            loop {
                children.push(self.parse_node(tree)?);
                self.parser.skip_comment_and_whitespace()?;
                if self.parser.consume_if(b',') {
                    continue;
                }
                if self.parser.consume_if(b')') {
                    break;
                }
                return Err(self.unexpected("',' or ')' between children"));
            }

            let node = tree.add_node(0.0);
            for child in children {
                tree.add_child(node, child)
                    .map_err(|e| ParsingError::invalid_newick_string(&self.parser, e.to_string()))?;
            }
            // Internal node labels carry no taxon
            self.parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
            node
        } else {
            let label = self.parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
            if label.is_empty() {
                return Err(self.unexpected("tip label"));
            }
            tree.add_tip(Taxon::new(label), 0.0)
        };

        let length = self.parse_branch_length()?;
        tree.set_branch_length(node, length);
        Ok(node)
    }

    /// Parses an optional `':' number`, scientific notation included.
    fn parse_branch_length(&mut self) -> Result<Option<f64>, ParsingError> {
        self.parser.skip_comment_and_whitespace()?;
        if !self.parser.consume_if(b':') {
            return Ok(None);
        }
        self.parser.skip_comment_and_whitespace()?;

        let mut number = String::new();
        while let Some(b) = self.parser.peek() {
            if !is_number_byte(b) {
                break;
            }
            number.push(b as char);
            self.parser.next_byte();
        }

        match number.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(ParsingError::invalid_branch_length(&self.parser, number)),
        }
    }

    fn unexpected(&self, expected: &str) -> ParsingError {
        match self.parser.peek() {
            None => ParsingError::unexpected_eof(&self.parser),
            Some(b) => ParsingError::invalid_newick_string(
                &self.parser,
                format!("Expected {} but found {:?}", expected, char::from(b)),
            ),
        }
    }
}
