use crate::config::ResolverConfig;
use crate::lexical::{LexicalMatch, LexicalMatcher};
use crate::name::{self, NameParts};
use crate::query::{self, Query, QueryType};

use super::EntityHandler;

/// Person names: the default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonHandler;

impl EntityHandler for PersonHandler {
    type Parts = NameParts;

    fn extract_parts(&self, descriptor: &str) -> NameParts {
        name::parse(descriptor).parts
    }

    fn is_unmatchable(&self, parts: &NameParts) -> bool {
        parts.is_empty()
    }

    fn query_type(&self, raw: &str) -> QueryType {
        query::classify(raw)
    }

    fn lexical_score(
        &self,
        query: &Query,
        parts: &NameParts,
        config: &ResolverConfig,
    ) -> Option<LexicalMatch> {
        LexicalMatcher::new(config).score(query, parts)
    }
}
