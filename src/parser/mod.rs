//! Low-level parsing infrastructure for tree input.
//!
//! Byte-level reading, error reporting and label quoting used by the
//! [Newick reader](crate::newick).

pub mod byte_parser;
pub(crate) mod byte_source;
pub mod parsing_error;
pub mod utils;

pub use byte_parser::{ByteParser, ConsumeMode};
pub use byte_source::{ByteSource, InMemoryByteSource};
pub use parsing_error::{ParsingError, ParsingErrorType};
