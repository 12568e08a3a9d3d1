//! Low-level byte-by-byte parser for ASCII text.
//!
//! This module provides [ByteParser] with peeking, consuming, comment
//! skipping and quote-aware label parsing. The Newick reader is built on it.

use crate::parser::byte_source::{ByteSource, InMemoryByteSource};
use crate::parser::parsing_error::ParsingError;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A byte-by-byte parser with support for peeking, consuming and skipping.
///
/// # Example
/// ```
/// use timetree::parser::{ByteParser, ConsumeMode};
///
/// let mut parser = ByteParser::for_str("  [&R] ('Wilson''s Storm-petrel':1.0,Takahe:1.0);");
/// parser.skip_comment_and_whitespace().unwrap();
/// assert!(parser.consume_if(b'('));
/// assert_eq!(parser.parse_label(b",:);").unwrap(), "Wilson's Storm-petrel");
///
/// parser.consume_until(b',', ConsumeMode::Inclusive);
/// assert_eq!(parser.parse_label(b",:);").unwrap(), "Takahe");
/// ```
pub struct ByteParser<S: ByteSource> {
    source: S,
}

impl ByteParser<InMemoryByteSource> {
    /// Creates a parser over a copy of `input`.
    pub fn from_bytes(input: &[u8]) -> Self {
        Self::new(InMemoryByteSource::from_vec(input.to_vec()))
    }

    /// Creates a parser over a copy of `input`.
    pub fn for_str(input: &str) -> Self {
        Self::from_bytes(input.as_bytes())
    }
}

impl<S: ByteSource> ByteParser<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Peeks at the current byte without consuming it, `None` at EOF.
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.source.peek()
    }

    /// Consumes and returns the current byte, `None` at EOF.
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        self.source.next_byte()
    }

    /// Skips space, tab, newline and carriage return.
    pub fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.next_byte();
        }
    }

    /// Skips a `[...]` comment if one starts here.
    ///
    /// # Returns
    /// * `Ok(true)` - A comment was found and consumed
    /// * `Ok(false)` - No comment at current position
    ///
    /// # Errors
    /// `UnclosedComment` if the comment has no closing `]`.
    pub fn skip_comment(&mut self) -> Result<bool, ParsingError> {
        if self.consume_if(b'[') {
            if !self.consume_until(b']', ConsumeMode::Inclusive) {
                return Err(ParsingError::unclosed_comment(self));
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Skips all consecutive whitespace and comments.
    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        self.skip_whitespace();
        while self.skip_comment()? {
            self.skip_whitespace();
        }
        Ok(())
    }

    /// Returns `true` if the current byte is `ch`.
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek() == Some(ch)
    }

    /// Consumes the current byte if it is `ch`.
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.next_byte();
            true
        } else {
            false
        }
    }

    /// Consumes bytes until `target` is found.
    ///
    /// # Returns
    /// `true` if the target was found, `false` if EOF was reached first
    pub fn consume_until(&mut self, target: u8, mode: ConsumeMode) -> bool {
        while let Some(b) = self.peek() {
            if b == target {
                if mode == ConsumeMode::Inclusive {
                    self.next_byte();
                }
                return true;
            }
            self.next_byte();
        }
        false
    }

    pub fn is_eof(&self) -> bool {
        self.source.is_eof()
    }

    /// Returns the current byte offset in the input.
    pub fn position(&self) -> usize {
        self.source.position()
    }

    /// Returns up to `k` bytes from the current position as (lossy) text.
    pub fn get_context_as_string(&self, k: usize) -> String {
        String::from_utf8_lossy(&self.source.get_context(k)).into_owned()
    }

    /// Parses a quoted or unquoted label.
    ///
    /// Leading comments and whitespace are skipped; an unquoted label ends
    /// at any of `delimiters` or at EOF.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_comment_and_whitespace()?;
        if self.peek_is(b'\'') {
            self.parse_quoted_label()
        } else {
            Ok(self.parse_unquoted_label(delimiters))
        }
    }

    /// Parses a label in single quotes, a doubled quote standing for one
    /// quote (`'Wilson''s'` is `Wilson's`). Expects the opening quote next.
    ///
    /// # Errors
    /// `UnclosedQuote` if the input ends before the closing quote.
    pub fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        self.next_byte(); // opening '

        let mut label = Vec::new();
        loop {
            match self.next_byte() {
                Some(b'\'') if self.peek_is(b'\'') => {
                    label.push(b'\'');
                    self.next_byte();
                }
                Some(b'\'') => break,
                Some(b) => label.push(b),
                None => return Err(ParsingError::unclosed_quote(self)),
            }
        }
        Ok(String::from_utf8_lossy(&label).into_owned())
    }

    /// Parses an unquoted label up to (excluding) the next delimiter.
    pub fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> String {
        let mut label = Vec::new();
        while let Some(b) = self.peek() {
            if delimiters.contains(&b) {
                break;
            }
            label.push(b);
            self.next_byte();
        }
        String::from_utf8_lossy(&label).into_owned()
    }
}

/// Whether `consume_until` also consumes the target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ConsumeMode {
    /// Consume the target along with everything before it.
    Inclusive,
    /// Stop at the target.
    Exclusive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_comment_and_whitespace() {
        let mut parser = ByteParser::for_str(" [a comment]\n\t[another] x");
        parser.skip_comment_and_whitespace().unwrap();
        assert_eq!(parser.peek(), Some(b'x'));
    }

    #[test]
    fn test_unclosed_comment() {
        let mut parser = ByteParser::for_str("[never closed");
        assert!(parser.skip_comment_and_whitespace().is_err());
    }

    #[test]
    fn test_unquoted_label_stops_at_delimiter() {
        let mut parser = ByteParser::for_str("Kakapo:1.0");
        assert_eq!(parser.parse_label(b":,);").unwrap(), "Kakapo");
        assert_eq!(parser.peek(), Some(b':'));
    }

    #[test]
    fn test_unclosed_quote() {
        let mut parser = ByteParser::for_str("'Kea");
        assert!(parser.parse_label(b":,);").is_err());
    }

    #[test]
    fn test_consume_until_exclusive() {
        let mut parser = ByteParser::for_str("abc;def");
        assert!(parser.consume_until(b';', ConsumeMode::Exclusive));
        assert_eq!(parser.position(), 3);
        assert!(!parser.consume_until(b'#', ConsumeMode::Inclusive));
        assert!(parser.is_eof());
    }
}
