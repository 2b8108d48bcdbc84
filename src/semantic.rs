//! Semantic similarity fallback.

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::EmbeddingError;
use crate::query::QueryType;

/// Scores precomputed entity vectors against a query vector.
#[derive(Debug, Clone, Copy)]
pub struct SemanticScorer {
    penalty: f32,
}

impl SemanticScorer {
    /// Creates a scorer that scales name-shaped queries by `penalty`.
    #[must_use]
    pub const fn new(penalty: f32) -> Self {
        Self { penalty }
    }

    /// Embeds the query once for the whole scan.
    ///
    /// # Errors
    ///
    /// Provider failures propagate unchanged; no zero vector is substituted.
    pub fn query_vector(
        &self,
        embedder: &dyn Embedder,
        text: &str,
    ) -> Result<Vec<f32>, EmbeddingError> {
        embedder.embed_checked(text)
    }

    /// Cosine similarity clamped to [0.0, 1.0], penalised for name-shaped queries.
    ///
    /// A query that looked like a name but matched no lexical rule is unlikely
    /// to mean this entity, so its semantic score is scaled down.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::DimensionMismatch`] when the vectors differ in length.
    pub fn score(
        &self,
        query_type: QueryType,
        query_vector: &[f32],
        entity_vector: &[f32],
    ) -> Result<f32, EmbeddingError> {
        let raw = cosine_similarity(query_vector, entity_vector)?.clamp(0.0, 1.0);
        Ok(if query_type.is_name_shaped() {
            raw * self.penalty
        } else {
            raw
        })
    }
}
