//! Search engine facade.
//!
//! [`Resolver`] owns the handler, the scoring constants and the embedding
//! provider. Indexes are passed in per call, so one resolver can serve any
//! number of catalogs and no process-wide state exists.

/// Routed worker-pool runtime.
pub mod runtime;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::ResolverConfig;
use crate::embedding::Embedder;
use crate::entity::{Entity, EntityId};
use crate::error::PersonaResult;
use crate::handler::{EntityHandler, PersonHandler};
use crate::index::EntityIndex;
use crate::operations::SearchRequest;
use crate::query::{Query, QueryType};
use crate::ranker::{MatchKind, MatchResult, ScoreCombiner};

/// Score at or above which a lone hit counts as a confident resolution.
pub const CONFIDENT_SCORE: f32 = 0.85;

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Matched entity.
    pub entity_id: EntityId,
    /// The entity's descriptor, for display.
    pub descriptor: String,
    /// Score in [0.0, 1.0].
    pub score: f32,
    /// Scoring path.
    pub match_kind: MatchKind,
}

/// Overall outcome of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Exactly one hit, scored at or above [`CONFIDENT_SCORE`].
    Exact,
    /// Several hits, all lexical.
    Partial,
    /// Semantic-only or mixed hits.
    Ambiguous,
    /// No hits.
    None,
}

impl Resolution {
    /// Classifies a ranked result list.
    #[must_use]
    pub fn classify(results: &[MatchResult]) -> Self {
        match results {
            [] => Self::None,
            [only] if only.score >= CONFIDENT_SCORE => Self::Exact,
            _ if results.len() > 1 && results.iter().all(|r| r.match_kind.is_lexical()) => {
                Self::Partial
            }
            _ => Self::Ambiguous,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Partial => write!(f, "partial"),
            Self::Ambiguous => write!(f, "ambiguous"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Ranked hits, truncated to the request limit.
    pub hits: Vec<SearchHit>,
    /// Hits before truncation.
    pub total_matches: usize,
    /// Classification of the query.
    pub query_type: QueryType,
    /// Threshold actually applied.
    pub threshold: f32,
    /// Overall outcome, computed before truncation.
    pub resolution: Resolution,
    /// Generation of the index searched.
    pub index_generation: u64,
    /// Wall time spent in the engine, in microseconds.
    pub elapsed_us: u64,
}

/// Name resolution engine.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use persona::{Entity, HashingEmbedder, MatchKind, Resolver, SearchRequest};
///
/// let resolver = Resolver::new(Arc::new(HashingEmbedder::default()));
/// let index = resolver
///     .build_index(vec![
///         Entity::new("John Smith - Engineer"),
///         Entity::new("John Michael Smith - Professor"),
///     ])
///     .unwrap();
///
/// let response = resolver.search(&index, &SearchRequest::new("John Smith")).unwrap();
/// assert_eq!(response.hits[0].match_kind, MatchKind::Exact);
/// assert_eq!(response.hits[1].match_kind, MatchKind::FirstLast);
/// ```
pub struct Resolver<H: EntityHandler = PersonHandler> {
    handler: H,
    config: ResolverConfig,
    embedder: Arc<dyn Embedder>,
}

impl<H: EntityHandler + fmt::Debug> fmt::Debug for Resolver<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("handler", &self.handler)
            .field("config", &self.config)
            .field("dimension", &self.embedder.dimension())
            .finish()
    }
}

impl Resolver<PersonHandler> {
    /// Person-name resolver with default constants.
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_handler(PersonHandler, embedder)
    }
}

impl<H: EntityHandler> Resolver<H> {
    /// Resolver for another entity type.
    #[must_use]
    pub fn with_handler(handler: H, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            handler,
            config: ResolverConfig::default(),
            embedder,
        }
    }

    /// Replaces the scoring constants.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any constant lies outside [0.0, 1.0].
    pub fn with_config(mut self, config: ResolverConfig) -> PersonaResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// The entity handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The scoring constants.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The embedding provider.
    #[must_use]
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Parses and embeds a catalog.
    ///
    /// # Errors
    ///
    /// Fails on the first descriptor the provider cannot embed.
    pub fn build_index(
        &self,
        entities: impl IntoIterator<Item = Entity>,
    ) -> PersonaResult<EntityIndex<H::Parts>> {
        Ok(EntityIndex::build(entities, &self.handler, self.embedder.as_ref())?)
    }

    /// Parses and classifies a raw query.
    #[must_use]
    pub fn parse_query(&self, raw: &str) -> Query {
        self.handler.parse_query(raw)
    }

    /// Ranks `index` against a request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PersonaError::Embedding`] when the query cannot be embedded.
    pub fn search(
        &self,
        index: &EntityIndex<H::Parts>,
        request: &SearchRequest,
    ) -> PersonaResult<SearchResponse> {
        let started = Instant::now();
        let query = self.parse_query(request.query());
        let query_type = query.query_type();
        let threshold = request
            .threshold()
            .unwrap_or_else(|| self.config.threshold_for(query_type));

        let results = ScoreCombiner::new(&self.handler, &self.config, self.embedder.as_ref())
            .rank(&query, index, threshold)?;

        let total_matches = results.len();
        let resolution = Resolution::classify(&results);
        let hits = results
            .iter()
            .take(request.limit().unwrap_or(usize::MAX))
            .filter_map(|r| {
                index.entry(r.position).map(|entry| SearchHit {
                    entity_id: r.entity_id,
                    descriptor: entry.entity.descriptor.clone(),
                    score: r.score,
                    match_kind: r.match_kind,
                })
            })
            .collect();

        #[allow(clippy::cast_possible_truncation)]
        let elapsed_us = started.elapsed().as_micros().min(u128::from(u64::MAX)) as u64;
        tracing::debug!(
            query_type = %query_type,
            threshold,
            total_matches,
            resolution = %resolution,
            elapsed_us,
            "search complete"
        );

        Ok(SearchResponse {
            hits,
            total_matches,
            query_type,
            threshold,
            resolution,
            index_generation: index.generation(),
            elapsed_us,
        })
    }

    /// Ranks `index` against a raw query with an optional threshold override.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a threshold that is NaN or outside
    /// [0.0, 1.0], and [`crate::PersonaError::Embedding`] when the query cannot be
    /// embedded.
    pub fn search_str(
        &self,
        index: &EntityIndex<H::Parts>,
        query: &str,
        threshold: Option<f32>,
    ) -> PersonaResult<Vec<SearchHit>> {
        let mut builder = SearchRequest::builder().query(query);
        if let Some(t) = threshold {
            builder = builder.threshold(t);
        }
        Ok(self.search(index, &builder.build()?)?.hits)
    }
}
