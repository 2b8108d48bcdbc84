//! Second-stage re-ranking.
//!
//! Re-ranking is a pure post-processor over engine output: it never changes
//! which entities matched, only their order and final scores.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::engine::{Resolution, SearchHit};
use crate::name::normalize_text;

/// A hit after re-ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankedHit {
    /// The original hit, score unchanged.
    pub hit: SearchHit,
    /// Score assigned by the engine.
    pub retrieval_score: f32,
    /// Score assigned by the re-ranker.
    pub rerank_score: f32,
    /// Blend of the two; hits are ordered by this.
    pub final_score: f32,
}

/// Second-stage relevance model.
pub trait Reranker: Send + Sync {
    /// Relevance of `descriptor` to `query` in [0.0, 1.0].
    fn relevance(&self, query: &str, descriptor: &str) -> f32;

    /// Weight of the retrieval score in the final blend.
    fn retrieval_weight(&self) -> f32 {
        0.6
    }

    /// Scores, blends and re-orders `hits`. Ties keep input order.
    fn rerank(&self, query: &str, hits: &[SearchHit]) -> Vec<RerankedHit> {
        let w = self.retrieval_weight();
        let mut out: Vec<RerankedHit> = hits
            .iter()
            .map(|hit| {
                let rerank_score = self.relevance(query, &hit.descriptor);
                RerankedHit {
                    retrieval_score: hit.score,
                    rerank_score,
                    final_score: w.mul_add(hit.score, (1.0 - w) * rerank_score),
                    hit: hit.clone(),
                }
            })
            .collect();
        out.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
        out
    }
}

/// Deterministic feature-based re-ranker.
///
/// Features, weighted 0.4 / 0.3 / 0.1 / 0.2:
/// - the query occurs verbatim in the descriptor
/// - share of query words present in the descriptor
/// - length ratio of the shorter to the longer text
/// - 1.0 when the descriptor starts with the query, else 0.5
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureReranker;

impl FeatureReranker {
    /// The four feature values, in weight order.
    #[must_use]
    pub fn features(query: &str, descriptor: &str) -> [f32; 4] {
        let q = normalize_text(query);
        let d = normalize_text(descriptor);

        let containment = if !q.is_empty() && d.contains(&q) { 1.0 } else { 0.0 };

        let query_words: HashSet<&str> = q.split_whitespace().collect();
        let doc_words: HashSet<&str> = d.split_whitespace().collect();
        #[allow(clippy::cast_precision_loss)]
        let overlap = if query_words.is_empty() {
            0.0
        } else {
            query_words.intersection(&doc_words).count() as f32 / query_words.len() as f32
        };

        let (ql, dl) = (q.chars().count(), d.chars().count());
        #[allow(clippy::cast_precision_loss)]
        let length_ratio = if ql.max(dl) == 0 {
            0.0
        } else {
            ql.min(dl) as f32 / ql.max(dl) as f32
        };

        let position = if !q.is_empty() && d.starts_with(&q) { 1.0 } else { 0.5 };

        [containment, overlap, length_ratio, position]
    }
}

impl Reranker for FeatureReranker {
    fn relevance(&self, query: &str, descriptor: &str) -> f32 {
        let [containment, overlap, length_ratio, position] = Self::features(query, descriptor);
        0.4 * containment + 0.3 * overlap + 0.1 * length_ratio + 0.2 * position
    }
}

/// Whether a second stage is worth running.
///
/// Skips small or clearly won result sets, reranks near-ties among the top
/// five, and otherwise reranks only ambiguous outcomes.
#[must_use]
pub fn should_rerank(hits: &[SearchHit], resolution: Resolution) -> bool {
    if hits.len() <= 3 {
        return false;
    }
    if hits[0].score > 0.95 {
        return false;
    }
    if hits.len() >= 5 {
        let top: Vec<f32> = hits.iter().take(5).map(|h| h.score).collect();
        if variance(&top) < 0.01 {
            return true;
        }
    }
    resolution == Resolution::Ambiguous
}

#[allow(clippy::cast_precision_loss)]
fn variance(values: &[f32]) -> f32 {
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n
}

/// Re-ranks the first `k` hits and appends the rest unchanged.
#[must_use]
pub fn rerank_top_k(
    query: &str,
    hits: &[SearchHit],
    k: usize,
    reranker: &dyn Reranker,
) -> Vec<RerankedHit> {
    let k = k.min(hits.len());
    let mut out = reranker.rerank(query, &hits[..k]);
    out.extend(hits[k..].iter().map(|hit| RerankedHit {
        retrieval_score: hit.score,
        rerank_score: hit.score,
        final_score: hit.score,
        hit: hit.clone(),
    }));
    out
}
