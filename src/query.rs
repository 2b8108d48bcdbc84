//! Query classification.
//!
//! The classification is intentionally coarse: it picks the threshold and the
//! lexical branch, nothing more.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::name::{fold_case, normalize_text, normalize_token};

/// Structural class of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Exactly one token, e.g. a first name, last name or initial.
    SingleToken,
    /// Two or three name-shaped tokens.
    FullName,
    /// Anything else, including the empty query.
    Semantic,
}

impl QueryType {
    /// True for the query types that look like a name.
    #[must_use]
    pub const fn is_name_shaped(self) -> bool {
        matches!(self, Self::SingleToken | Self::FullName)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleToken => write!(f, "single_token"),
            Self::FullName => write!(f, "full_name"),
            Self::Semantic => write!(f, "semantic"),
        }
    }
}

/// A name-shaped token: letters, optionally joined by `-` or `'`, with an
/// optional trailing period (`"M."`).
fn is_name_token(token: &str) -> bool {
    let body = token.strip_suffix('.').unwrap_or(token);
    let Some(first) = body.chars().next() else {
        return false;
    };
    let Some(last) = body.chars().last() else {
        return false;
    };
    first.is_alphabetic()
        && last.is_alphabetic()
        && body
            .chars()
            .all(|c| c.is_alphabetic() || c == '-' || c == '\'')
}

/// Classifies a person-name query.
///
/// # Examples
///
/// ```
/// use persona::{classify, QueryType};
///
/// assert_eq!(classify("Smith"), QueryType::SingleToken);
/// assert_eq!(classify("John M. Smith"), QueryType::FullName);
/// assert_eq!(classify("software engineer at google"), QueryType::Semantic);
/// assert_eq!(classify(""), QueryType::Semantic);
/// ```
#[must_use]
pub fn classify(raw: &str) -> QueryType {
    let folded = fold_case(raw);
    let tokens: Vec<&str> = folded.split_whitespace().collect();
    match tokens.len() {
        1 => QueryType::SingleToken,
        2 | 3 if tokens.iter().all(|t| is_name_token(t)) => QueryType::FullName,
        _ => QueryType::Semantic,
    }
}

/// A parsed query, local to a single search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: String,
    normalized: String,
    tokens: Vec<String>,
    query_type: QueryType,
}

impl Query {
    /// Parses a raw query with the given classification.
    #[must_use]
    pub fn new(raw: impl Into<String>, query_type: QueryType) -> Self {
        let raw = raw.into();
        let normalized = normalize_text(&raw);
        let tokens = raw
            .split_whitespace()
            .map(normalize_token)
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            raw,
            normalized,
            tokens,
            query_type,
        }
    }

    /// Parses and classifies a person-name query.
    #[must_use]
    pub fn person(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let query_type = classify(&raw);
        Self::new(raw, query_type)
    }

    /// The query as given.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Case-folded, whitespace-collapsed query text.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Case-folded tokens with surrounding punctuation removed.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Structural classification.
    #[must_use]
    pub const fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// True when the query has no content after normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_token_queries() {
        assert_eq!(classify("John"), QueryType::SingleToken);
        assert_eq!(classify("  J  "), QueryType::SingleToken);
        assert_eq!(classify("M."), QueryType::SingleToken);
        assert_eq!(classify("12345"), QueryType::SingleToken);
    }

    #[test]
    fn full_name_queries() {
        assert_eq!(classify("John Smith"), QueryType::FullName);
        assert_eq!(classify("john   smith"), QueryType::FullName);
        assert_eq!(classify("John M. Smith"), QueryType::FullName);
        assert_eq!(classify("Mary-Jane O'Brien"), QueryType::FullName);
        assert_eq!(classify("J. Smith"), QueryType::FullName);
    }

    #[test]
    fn semantic_queries() {
        assert_eq!(classify(""), QueryType::Semantic);
        assert_eq!(classify("   "), QueryType::Semantic);
        assert_eq!(classify("John Ronald Reuel Tolkien"), QueryType::Semantic);
        assert_eq!(classify("engineer at google"), QueryType::Semantic);
        assert_eq!(classify("John Smith2"), QueryType::Semantic);
        assert_eq!(classify("John - Smith"), QueryType::Semantic);
        assert_eq!(classify("John Smith,"), QueryType::Semantic);
    }

    #[test]
    fn classification_is_case_insensitive() {
        for q in ["john smith", "JOHN SMITH", "John Smith"] {
            assert_eq!(classify(q), QueryType::FullName);
        }
    }

    #[test]
    fn query_tokens_are_normalized() {
        let q = Query::person("  John  M.  SMITH ");
        assert_eq!(q.query_type(), QueryType::FullName);
        assert_eq!(q.tokens(), &["john", "m", "smith"]);
        assert_eq!(q.normalized(), "john m. smith");
        assert_eq!(q.raw(), "  John  M.  SMITH ");
    }

    #[test]
    fn empty_query_has_no_tokens() {
        let q = Query::person("");
        assert!(q.is_empty());
        assert!(q.tokens().is_empty());
        assert_eq!(q.query_type(), QueryType::Semantic);
    }

    #[test]
    fn name_shaped_types() {
        assert!(QueryType::SingleToken.is_name_shaped());
        assert!(QueryType::FullName.is_name_shaped());
        assert!(!QueryType::Semantic.is_name_shaped());
    }
}
