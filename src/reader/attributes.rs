//! Parsing of the free-text attribute column (column 9) of a GTF record.
//!
//! The column is a list of `key "value"` pairs separated by `"; "`, usually with
//! a trailing `;`:
//!
//! ```text
//! gene_id "G1"; transcript_id "T1"; tag "basic";
//! ```

use crate::error::TxInfoError;
use std::collections::HashMap;

const PAIR_SEPARATOR: &str = "; ";
const KEY_VALUE_SEPARATOR: &str = " \"";

/// The attributes of a single record.
///
/// Looking up a key that the record does not carry gives [None], which is
/// different from a key that is present with an empty value (`Some("")`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeMap {
    inner: HashMap<String, String>,
}

impl AttributeMap {
    pub fn new() -> AttributeMap {
        AttributeMap {
            inner: HashMap::with_capacity(16),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(|v| v.as_str())
    }

    /// Like [AttributeMap::get], but returns an owned value ready to be pushed into a column.
    pub fn get_owned(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    // a repeated key (e.g. several `tag`s) keeps its last value
    fn insert(&mut self, key: &str, value: &str) {
        self.inner.insert(key.to_string(), value.to_string());
    }
}

/// Splits a single `key "value"` token. Returns [None] if the token has no `' "'`.
fn split_token(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once(KEY_VALUE_SEPARATOR)?;
    let value = value.trim_end_matches(';').trim_matches('"');
    Some((key.trim(), value))
}

/// Yields the non-empty tokens of an attribute column.
fn tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(PAIR_SEPARATOR)
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && *t != ";")
}

/// Parses the attribute column of the record found on line `line`.
///
/// Empty tokens, such as the one left behind by a trailing separator, are ignored.
/// A token that does not contain `' "'` (e.g. `level 2`) makes the whole parse fail
/// with [TxInfoError::MalformedAttribute]; it is up to the caller to decide whether
/// that drops the record or stops the run.
pub fn parse_attributes(raw: &str, line: usize) -> Result<AttributeMap, TxInfoError> {
    let mut attrs = AttributeMap::new();
    for token in tokens(raw) {
        let (key, value) = split_token(token).ok_or_else(|| TxInfoError::MalformedAttribute {
            line,
            token: token.to_string(),
        })?;
        attrs.insert(key, value);
    }
    Ok(attrs)
}

/// Parses the attribute column, dropping malformed tokens instead of failing.
///
/// Returns the parsed attributes together with the number of tokens that were dropped.
pub fn parse_attributes_lenient(raw: &str) -> (AttributeMap, usize) {
    let mut attrs = AttributeMap::new();
    let mut n_dropped = 0usize;
    for token in tokens(raw) {
        match split_token(token) {
            Some((key, value)) => attrs.insert(key, value),
            None => n_dropped += 1,
        }
    }
    (attrs, n_dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_pairs() {
        let attrs = parse_attributes(r#"gene_id "G1"; transcript_id "T1"; tag "basic";"#, 1).unwrap();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs.get("gene_id"), Some("G1"));
        assert_eq!(attrs.get("transcript_id"), Some("T1"));
        assert_eq!(attrs.get("tag"), Some("basic"));
        assert_eq!(attrs.get("gene_name"), None);
    }

    #[test]
    fn trailing_separator_and_missing_semicolon() {
        let attrs = parse_attributes(r#"gene_id "G1"; transcript_id "T1"; "#, 1).unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("transcript_id"), Some("T1"));

        let attrs = parse_attributes(r#"gene_id "G1"; transcript_id "T1""#, 1).unwrap();
        assert_eq!(attrs.get("transcript_id"), Some("T1"));

        let attrs = parse_attributes("", 1).unwrap();
        assert!(attrs.is_empty());
    }

    #[test]
    fn empty_value_is_not_absent() {
        let attrs = parse_attributes(r#"gene_id "G1"; gene_name "";"#, 1).unwrap();
        assert_eq!(attrs.get("gene_name"), Some(""));
        assert!(attrs.contains_key("gene_name"));
        assert!(!attrs.contains_key("gene_biotype"));
    }

    #[test]
    fn value_keeps_inner_spaces() {
        let attrs = parse_attributes(r#"gene_id "G1"; note "two words";"#, 1).unwrap();
        assert_eq!(attrs.get("note"), Some("two words"));
    }

    #[test]
    fn repeated_key_keeps_last() {
        let attrs = parse_attributes(r#"gene_id "G1"; tag "basic"; tag "CCDS";"#, 1).unwrap();
        assert_eq!(attrs.get("tag"), Some("CCDS"));
    }

    #[test]
    fn unquoted_token_is_malformed() {
        let err = parse_attributes(r#"gene_id "G1"; level 2; tag "basic";"#, 7).unwrap_err();
        match err {
            TxInfoError::MalformedAttribute { line, token } => {
                assert_eq!(line, 7);
                assert_eq!(token, "level 2");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn lenient_parse_drops_bad_tokens() {
        let (attrs, n_dropped) = parse_attributes_lenient(r#"gene_id "G1"; level 2; tag "basic";"#);
        assert_eq!(n_dropped, 1);
        assert_eq!(attrs.get("gene_id"), Some("G1"));
        assert_eq!(attrs.get("tag"), Some("basic"));
        assert_eq!(attrs.get("level"), None);
    }
}
