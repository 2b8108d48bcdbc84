//! Score combination and ranking.
//!
//! Every entity receives exactly one score: the exact-descriptor check first,
//! then the handler's lexical rules, then the semantic fallback. Lexical and
//! semantic scores are never blended.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ResolverConfig;
use crate::embedding::Embedder;
use crate::entity::EntityId;
use crate::error::EmbeddingError;
use crate::handler::EntityHandler;
use crate::index::EntityIndex;
use crate::query::Query;
use crate::semantic::SemanticScorer;

/// Which path produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Full or token-level exact match.
    Exact,
    /// First, last and a subsequence of middle names match.
    FullWithMiddle,
    /// First and last match; middle given or stored as an initial.
    InitialMiddle,
    /// First and last match; middle ignored.
    FirstLast,
    /// Single token equals a middle name.
    MiddleExact,
    /// Single letter equals an initial.
    Initial,
    /// Edit-distance match above the floor.
    Fuzzy,
    /// Embedding similarity fallback.
    Semantic,
    /// Word-boundary containment (location and role handlers).
    Partial,
}

impl MatchKind {
    /// True for every kind except [`MatchKind::Semantic`].
    #[must_use]
    pub const fn is_lexical(self) -> bool {
        !matches!(self, Self::Semantic)
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exact => "exact",
            Self::FullWithMiddle => "full_with_middle",
            Self::InitialMiddle => "initial_middle",
            Self::FirstLast => "first_last",
            Self::MiddleExact => "middle_exact",
            Self::Initial => "initial",
            Self::Fuzzy => "fuzzy",
            Self::Semantic => "semantic",
            Self::Partial => "partial",
        };
        f.write_str(s)
    }
}

/// One scored entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Matched entity.
    pub entity_id: EntityId,
    /// Score in [0.0, 1.0].
    pub score: f32,
    /// Scoring path.
    pub match_kind: MatchKind,
    /// Position of the entity in the indexed catalog.
    pub position: usize,
}

/// Combines lexical and semantic scoring over an index.
#[derive(Clone, Copy)]
pub struct ScoreCombiner<'a, H: EntityHandler> {
    handler: &'a H,
    config: &'a ResolverConfig,
    embedder: &'a dyn Embedder,
}

impl<H: EntityHandler> fmt::Debug for ScoreCombiner<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreCombiner")
            .field("config", self.config)
            .field("dimension", &self.embedder.dimension())
            .finish_non_exhaustive()
    }
}

impl<'a, H: EntityHandler> ScoreCombiner<'a, H> {
    /// Creates a combiner.
    #[must_use]
    pub fn new(handler: &'a H, config: &'a ResolverConfig, embedder: &'a dyn Embedder) -> Self {
        Self {
            handler,
            config,
            embedder,
        }
    }

    /// Scores every entity, drops those below `threshold`, and sorts the rest
    /// by descending score. Ties keep catalog order.
    ///
    /// The query is embedded at most once, and only if some entity falls
    /// through to the semantic path. An empty query yields no results and
    /// never reaches the provider.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the query embedding fails.
    pub fn rank(
        &self,
        query: &Query,
        index: &EntityIndex<H::Parts>,
        threshold: f32,
    ) -> Result<Vec<MatchResult>, EmbeddingError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let query_type = query.query_type();
        let scorer = SemanticScorer::new(self.config.semantic_penalty);
        let lexical = self.handler.attempts_lexical(query_type);
        let mut query_vector: Option<Vec<f32>> = None;
        let mut results = Vec::new();

        for (position, entry) in index.iter().enumerate() {
            let lexical_match = if query.normalized() == entry.normalized_descriptor {
                Some((self.config.scores.exact, MatchKind::Exact))
            } else if lexical {
                self.handler
                    .lexical_score(query, &entry.parts, self.config)
                    .map(|m| (m.score, m.kind))
            } else {
                None
            };

            let (score, match_kind) = match lexical_match {
                Some(hit) => hit,
                None => {
                    if query_vector.is_none() {
                        query_vector =
                            Some(scorer.query_vector(self.embedder, query.normalized())?);
                    }
                    let qv = query_vector.as_deref().unwrap_or_default();
                    let base = scorer.score(query_type, qv, &entry.vector)?;
                    let adjusted = self.handler.custom_score(query, &entry.parts, base);
                    (adjusted.clamp(0.0, 1.0), MatchKind::Semantic)
                }
            };

            if score >= threshold {
                results.push(MatchResult {
                    entity_id: entry.entity.id,
                    score,
                    match_kind,
                    position,
                });
            }
        }

        // Stable: equal scores stay in catalog order.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            query_type = %query_type,
            threshold,
            candidates = index.len(),
            matched = results.len(),
            embedded = query_vector.is_some(),
            "ranked query"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::entity::Entity;
    use crate::handler::PersonHandler;

    /// Counts embed calls and optionally fails query embeddings.
    struct CountingEmbedder {
        inner: HashingEmbedder,
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl CountingEmbedder {
        fn new(fail_after: Option<usize>) -> Self {
            Self {
                inner: HashingEmbedder::default(),
                calls: AtomicUsize::new(0),
                fail_after,
            }
        }
    }

    impl Embedder for CountingEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| n >= limit) {
                return Err(EmbeddingError::ProviderUnavailable {
                    message: "offline".into(),
                });
            }
            self.inner.embed(text)
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
    }

    fn catalog() -> Vec<Entity> {
        vec![
            Entity::keyed("js", "John Smith - Software Engineer at Google"),
            Entity::keyed("jms", "John Michael Smith - Professor at MIT"),
            Entity::keyed("jd", "Jane Doe - Product Manager at Microsoft"),
        ]
    }

    fn rank(query: &str, threshold: f32, embedder: &dyn Embedder) -> Result<Vec<MatchResult>, EmbeddingError> {
        let config = ResolverConfig::default();
        let index = EntityIndex::build(catalog(), &PersonHandler, embedder).unwrap();
        ScoreCombiner::new(&PersonHandler, &config, embedder).rank(&Query::person(query), &index, threshold)
    }

    #[test]
    fn lexical_results_are_sorted_and_filtered() {
        let embedder = HashingEmbedder::default();
        let results = rank("John Smith", 0.5, &embedder).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].entity_id, EntityId::from_key("js"));
        assert_eq!(results[0].match_kind, MatchKind::Exact);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[1].match_kind, MatchKind::FirstLast);
        assert_eq!(results[1].position, 1);
    }

    #[test]
    fn ties_keep_catalog_order() {
        let embedder = HashingEmbedder::default();
        let results = rank("J", 0.5, &embedder).unwrap();
        let positions: Vec<usize> = results.iter().map(|r| r.position).collect();
        assert_eq!(positions, [0, 1, 2]);
        assert!(results.iter().all(|r| (r.score - 0.85).abs() < 1e-6));
    }

    #[test]
    fn pure_lexical_queries_never_embed() {
        let embedder = CountingEmbedder::new(None);
        let index = EntityIndex::build(catalog(), &PersonHandler, &embedder).unwrap();
        let built = embedder.calls.load(Ordering::SeqCst);

        let config = ResolverConfig::default();
        let combiner = ScoreCombiner::new(&PersonHandler, &config, &embedder);
        combiner.rank(&Query::person("J"), &index, 0.5).unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), built);

        // Jane Doe falls through to semantic: exactly one query embedding.
        combiner.rank(&Query::person("Smith"), &index, 0.0).unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), built + 1);
    }

    #[test]
    fn empty_query_never_embeds() {
        let embedder = CountingEmbedder::new(Some(3));
        let results = rank("   ", 0.0, &embedder).unwrap();
        assert!(results.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn provider_failure_surfaces() {
        // Catalog embeds succeed, the query embed fails.
        let embedder = CountingEmbedder::new(Some(3));
        let err = rank("software engineer at google", 0.4, &embedder).unwrap_err();
        assert!(matches!(err, EmbeddingError::ProviderUnavailable { .. }));
    }

    #[test]
    fn exact_descriptor_wins_for_semantic_queries() {
        let embedder = HashingEmbedder::default();
        let results = rank("jane doe - product manager at microsoft", 0.4, &embedder).unwrap();
        assert_eq!(results[0].entity_id, EntityId::from_key("jd"));
        assert_eq!(results[0].match_kind, MatchKind::Exact);
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn match_kind_display_matches_serde() {
        for kind in [MatchKind::FullWithMiddle, MatchKind::Semantic, MatchKind::Partial] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
        assert!(!MatchKind::Semantic.is_lexical());
        assert!(MatchKind::Fuzzy.is_lexical());
    }
}
