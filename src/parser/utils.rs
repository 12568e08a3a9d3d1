//! Label quoting for Newick output.

/// Characters that force a label into single quotes.
const SPECIAL_CHARS: &[char] = &[' ', ',', ';', '\t', '\n', '\r', '(', ')', ':', '[', ']', '\''];

/// Checks if a label is enclosed in single quotes.
///
/// # Examples
/// ```
/// # use timetree::parser::utils::is_single_quoted;
/// assert!(!is_single_quoted("Pukeko"));
/// assert!(is_single_quoted("'Swamp hen'"));
/// ```
pub fn is_single_quoted(label: &str) -> bool {
    label.starts_with('\'') && label.ends_with('\'') && label.len() >= 2
}

/// Returns `true` if `label` cannot be written unquoted.
pub fn needs_quotes(label: &str) -> bool {
    label.is_empty() || label.contains(SPECIAL_CHARS)
}

/// Escapes a label for Newick output.
///
/// Labels containing whitespace or punctuation are wrapped in single quotes
/// with inner single quotes doubled; all others are written verbatim, so that
/// reading the output gives back the same label.
///
/// # Examples
/// ```
/// # use timetree::parser::utils::escape_label;
/// assert_eq!(escape_label("Pukeko"), "Pukeko");
/// assert_eq!(escape_label("Australasian_Swamphen"), "Australasian_Swamphen");
/// assert_eq!(escape_label("Australasian Swamphen"), "'Australasian Swamphen'");
/// assert_eq!(escape_label("Pu[ke]ko"), "'Pu[ke]ko'");
/// assert_eq!(escape_label("Baillon's Crake"), "'Baillon''s Crake'");
/// ```
pub fn escape_label(label: &str) -> String {
    if needs_quotes(label) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

/// Reverses [escape_label].
///
/// # Examples
/// ```
/// # use timetree::parser::utils::unescape_label;
/// assert_eq!(unescape_label("Pukeko"), "Pukeko");
/// assert_eq!(unescape_label("'Baillon''s Crake'"), "Baillon's Crake");
/// ```
pub fn unescape_label(label: &str) -> String {
    if is_single_quoted(label) {
        label[1..label.len() - 1].replace("''", "'")
    } else {
        label.to_string()
    }
}
