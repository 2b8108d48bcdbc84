//! Entity-type handlers.
//!
//! A handler knows how to decompose one kind of descriptor, classify queries
//! against it, and score the lexical side of a match. The ranker only talks
//! to the [`EntityHandler`] trait, so it stays agnostic of entity types.

mod location;
mod person;
mod role;

use std::fmt;

use crate::config::ResolverConfig;
use crate::entity::EntityType;
use crate::lexical::LexicalMatch;
use crate::name::{context_separator, NameParts};
use crate::query::{Query, QueryType};

pub use location::{LocationHandler, LocationParts};
pub use person::PersonHandler;
pub use role::{RoleHandler, RoleParts};

/// Capability interface for one entity type.
pub trait EntityHandler: Send + Sync {
    /// Parsed, cached per-entity representation.
    type Parts: Clone + fmt::Debug + Send + Sync;

    /// Decomposes a descriptor. Never fails.
    fn extract_parts(&self, descriptor: &str) -> Self::Parts;

    /// True when the parts can never satisfy a lexical rule.
    fn is_unmatchable(&self, _parts: &Self::Parts) -> bool {
        false
    }

    /// Classifies a raw query.
    fn query_type(&self, raw: &str) -> QueryType;

    /// Whether lexical rules run for this query type.
    fn attempts_lexical(&self, query_type: QueryType) -> bool {
        query_type != QueryType::Semantic
    }

    /// Lexical score, or `None` to fall through to semantic scoring.
    fn lexical_score(
        &self,
        query: &Query,
        parts: &Self::Parts,
        config: &ResolverConfig,
    ) -> Option<LexicalMatch>;

    /// Adjusts a semantic score with type-specific knowledge.
    fn custom_score(&self, _query: &Query, _parts: &Self::Parts, base: f32) -> f32 {
        base
    }

    /// Parses and classifies a raw query.
    fn parse_query(&self, raw: &str) -> Query {
        Query::new(raw, self.query_type(raw))
    }
}

/// Text before the first ` - ` / ` at `, trimmed.
fn primary_segment(descriptor: &str) -> &str {
    match context_separator().find(descriptor) {
        Some(m) => descriptor[..m.start()].trim(),
        None => descriptor.trim(),
    }
}

/// True when `needle` occurs in `haystack` on word boundaries.
fn contains_words(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

/// Parts produced by [`AnyHandler`].
#[derive(Debug, Clone)]
pub enum AnyParts {
    /// Person name parts.
    Person(NameParts),
    /// Location parts.
    Location(LocationParts),
    /// Role parts.
    Role(RoleParts),
}

/// Handler chosen at runtime from an [`EntityType`] tag.
///
/// # Examples
///
/// ```
/// use persona::{AnyHandler, EntityHandler, EntityType, QueryType};
///
/// let handler = AnyHandler::for_type(EntityType::Location);
/// assert_eq!(handler.query_type("San Francisco, CA"), QueryType::FullName);
/// ```
#[derive(Debug, Clone)]
pub enum AnyHandler {
    /// Person names.
    Person(PersonHandler),
    /// Places.
    Location(LocationHandler),
    /// Work roles and job titles.
    Role(RoleHandler),
}

impl AnyHandler {
    /// Factory keyed on the entity-type tag.
    #[must_use]
    pub fn for_type(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Person => Self::Person(PersonHandler),
            EntityType::Location => Self::Location(LocationHandler::default()),
            EntityType::Role => Self::Role(RoleHandler::default()),
        }
    }

    /// The entity type this handler serves.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        match self {
            Self::Person(_) => EntityType::Person,
            Self::Location(_) => EntityType::Location,
            Self::Role(_) => EntityType::Role,
        }
    }
}

impl EntityHandler for AnyHandler {
    type Parts = AnyParts;

    fn extract_parts(&self, descriptor: &str) -> AnyParts {
        match self {
            Self::Person(h) => AnyParts::Person(h.extract_parts(descriptor)),
            Self::Location(h) => AnyParts::Location(h.extract_parts(descriptor)),
            Self::Role(h) => AnyParts::Role(h.extract_parts(descriptor)),
        }
    }

    fn is_unmatchable(&self, parts: &AnyParts) -> bool {
        match (self, parts) {
            (Self::Person(h), AnyParts::Person(p)) => h.is_unmatchable(p),
            (Self::Location(h), AnyParts::Location(p)) => h.is_unmatchable(p),
            (Self::Role(h), AnyParts::Role(p)) => h.is_unmatchable(p),
            _ => true,
        }
    }

    fn query_type(&self, raw: &str) -> QueryType {
        match self {
            Self::Person(h) => h.query_type(raw),
            Self::Location(h) => h.query_type(raw),
            Self::Role(h) => h.query_type(raw),
        }
    }

    fn attempts_lexical(&self, query_type: QueryType) -> bool {
        match self {
            Self::Person(h) => h.attempts_lexical(query_type),
            Self::Location(h) => h.attempts_lexical(query_type),
            Self::Role(h) => h.attempts_lexical(query_type),
        }
    }

    fn lexical_score(
        &self,
        query: &Query,
        parts: &AnyParts,
        config: &ResolverConfig,
    ) -> Option<LexicalMatch> {
        match (self, parts) {
            (Self::Person(h), AnyParts::Person(p)) => h.lexical_score(query, p, config),
            (Self::Location(h), AnyParts::Location(p)) => h.lexical_score(query, p, config),
            (Self::Role(h), AnyParts::Role(p)) => h.lexical_score(query, p, config),
            _ => None,
        }
    }

    fn custom_score(&self, query: &Query, parts: &AnyParts, base: f32) -> f32 {
        match (self, parts) {
            (Self::Person(h), AnyParts::Person(p)) => h.custom_score(query, p, base),
            (Self::Location(h), AnyParts::Location(p)) => h.custom_score(query, p, base),
            (Self::Role(h), AnyParts::Role(p)) => h.custom_score(query, p, base),
            _ => base,
        }
    }
}
