//! Constants for reading and writing Newick strings.

/// Bytes ending an unquoted label: parentheses, comma, colon, semicolon, comment start, whitespace
pub(crate) const NEWICK_LABEL_DELIMITERS: &[u8] = b"()[],:; \n\t\r";

/// Bytes that may appear in a branch length (digits, sign, point, exponent, `inf`/`nan` excluded)
pub(crate) fn is_number_byte(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E')
}

/// Guess of number of tips, when unknown
pub(crate) const DEFAULT_NUM_TIPS_GUESS: usize = 16;
