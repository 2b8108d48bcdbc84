//! Descriptor parsing: name segment, context segment, and name parts.
//!
//! A descriptor such as `"John M. Smith - Professor of Physics"` is split on
//! the first conventional separator into a name segment (`"John M. Smith"`)
//! and a context segment (`"Professor of Physics"`). The name segment is then
//! decomposed into first, middle and last tokens.
//!
//! Parsing never fails. A descriptor without usable tokens yields empty
//! [`NameParts`], which no lexical rule can match.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Spaced dash (ASCII, en or em), or the ` at ` / ` of ` connectors.
const SEPARATOR_PATTERN: &str = r"\s+(?:-|\x{2013}|\x{2014}|at|of)\s+";

/// Spaced dash or ` at `. Locations and roles keep ` of ` ("Head of Sales").
const CONTEXT_SEPARATOR_PATTERN: &str = r"\s+(?:-|\x{2013}|\x{2014}|at)\s+";

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(SEPARATOR_PATTERN).expect("separator pattern is valid"))
}

/// Separator between a location or role and its trailing context.
pub(crate) fn context_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| {
        Regex::new(CONTEXT_SEPARATOR_PATTERN).expect("context separator pattern is valid")
    })
}

/// Case-folds text for comparison.
///
/// Upper-casing first makes both spellings of a name meet: `"Strauß"` and
/// `"STRAUSS"` both fold to `"strauss"`. The result is NFC-composed, so
/// decomposed and precomposed accents compare equal.
#[must_use]
pub fn fold_case(text: &str) -> String {
    text.to_uppercase().to_lowercase().nfc().collect()
}

/// Case-folds a token and strips leading/trailing punctuation.
///
/// `"M."` becomes `"m"`, `"(Bob)"` becomes `"bob"`, `"O'Brien,"` becomes
/// `"o'brien"`. Returns an empty string for punctuation-only tokens.
#[must_use]
pub fn normalize_token(token: &str) -> String {
    fold_case(token.trim_matches(|c: char| !c.is_alphanumeric()))
}

/// Collapses runs of whitespace and case-folds.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(fold_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn initial_of(token: &str) -> Option<char> {
    token.chars().next()
}

/// Case-folded comparison keys, derived once per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NameKeys {
    first: Option<String>,
    middle: Vec<String>,
    last: Option<String>,
}

/// First, middle and last name tokens plus their initials.
///
/// Display fields keep the descriptor's casing (punctuation trimmed). The
/// accessor methods return the case-folded copies all matching runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    /// First token of the name segment.
    pub first: Option<String>,
    /// Tokens between first and last, in order.
    pub middle: Vec<String>,
    /// Last token, present only when the name has two or more tokens.
    pub last: Option<String>,
    /// Upper-case initial of `first`.
    pub first_initial: Option<char>,
    /// Upper-case initial of `last`.
    pub last_initial: Option<char>,
    /// Upper-case initials of `middle`, in order.
    pub middle_initials: Vec<char>,
    keys: NameKeys,
}

impl NameParts {
    /// Builds parts from already-cleaned display tokens.
    fn from_tokens(tokens: Vec<String>) -> Self {
        let mut tokens = tokens;
        let (first, middle, last) = match tokens.len() {
            0 => (None, Vec::new(), None),
            1 => (tokens.pop(), Vec::new(), None),
            _ => {
                let last = tokens.pop();
                let mut rest = tokens.into_iter();
                let first = rest.next();
                (first, rest.collect(), last)
            }
        };

        let upper_initial = |t: &String| initial_of(t).and_then(|c| c.to_uppercase().next());
        let keys = NameKeys {
            first: first.as_deref().map(fold_case),
            middle: middle.iter().map(|m| fold_case(m)).collect(),
            last: last.as_deref().map(fold_case),
        };

        Self {
            first_initial: first.as_ref().and_then(upper_initial),
            last_initial: last.as_ref().and_then(upper_initial),
            middle_initials: middle.iter().filter_map(upper_initial).collect(),
            first,
            middle,
            last,
            keys,
        }
    }

    /// Case-folded first name.
    #[must_use]
    pub fn first_key(&self) -> Option<&str> {
        self.keys.first.as_deref()
    }

    /// Case-folded last name.
    #[must_use]
    pub fn last_key(&self) -> Option<&str> {
        self.keys.last.as_deref()
    }

    /// Case-folded middle names.
    #[must_use]
    pub fn middle_keys(&self) -> &[String] {
        &self.keys.middle
    }

    /// Case-folded first initial.
    #[must_use]
    pub fn first_initial_key(&self) -> Option<char> {
        self.first_key().and_then(initial_of)
    }

    /// Case-folded last initial.
    #[must_use]
    pub fn last_initial_key(&self) -> Option<char> {
        self.last_key().and_then(initial_of)
    }

    /// Case-folded middle initials.
    pub fn middle_initial_keys(&self) -> impl Iterator<Item = char> + '_ {
        self.keys.middle.iter().filter_map(|m| initial_of(m))
    }

    /// All case-folded name tokens in order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.token_count());
        out.extend(self.first_key());
        out.extend(self.keys.middle.iter().map(String::as_str));
        out.extend(self.last_key());
        out
    }

    /// Number of name tokens.
    #[must_use]
    pub fn token_count(&self) -> usize {
        usize::from(self.first.is_some()) + self.middle.len() + usize::from(self.last.is_some())
    }

    /// True when no usable token was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }
}

/// A parsed descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDescriptor {
    /// Text before the first separator, trimmed.
    pub name_segment: String,
    /// Text after the first separator, trimmed; empty when there is none.
    pub context_segment: String,
    /// Decomposed name.
    pub parts: NameParts,
}

/// Splits a descriptor into name and context segments at the first separator.
#[must_use]
pub fn split_descriptor(descriptor: &str) -> (&str, &str) {
    match separator().find(descriptor) {
        Some(m) => (descriptor[..m.start()].trim(), descriptor[m.end()..].trim()),
        None => (descriptor.trim(), ""),
    }
}

/// Parses a descriptor into its name segment, context segment and name parts.
///
/// # Examples
///
/// ```
/// use persona::name::parse;
///
/// let parsed = parse("John M. Smith - Professor");
/// assert_eq!(parsed.name_segment, "John M. Smith");
/// assert_eq!(parsed.context_segment, "Professor");
/// assert_eq!(parsed.parts.first.as_deref(), Some("John"));
/// assert_eq!(parsed.parts.middle, vec!["M".to_string()]);
/// assert_eq!(parsed.parts.last.as_deref(), Some("Smith"));
/// ```
#[must_use]
pub fn parse(descriptor: &str) -> ParsedDescriptor {
    let (name_segment, context_segment) = split_descriptor(descriptor);
    ParsedDescriptor {
        name_segment: name_segment.to_string(),
        context_segment: context_segment.to_string(),
        parts: parse_name(name_segment),
    }
}

/// Decomposes a bare name (no context) into [`NameParts`].
#[must_use]
pub fn parse_name(name: &str) -> NameParts {
    let tokens = name
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    NameParts::from_tokens(tokens)
}
