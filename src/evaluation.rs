//! Retrieval quality metrics over labeled queries.
//!
//! Used to calibrate thresholds and score constants against a catalog whose
//! correct answers are known.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::engine::Resolver;
use crate::entity::EntityId;
use crate::error::PersonaResult;
use crate::handler::EntityHandler;
use crate::index::EntityIndex;
use crate::operations::SearchRequest;

/// A query with its expected answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledQuery {
    /// Raw query text.
    pub query: String,
    /// Entities a correct search returns, in any order.
    pub expected: Vec<EntityId>,
    /// Threshold override for this query.
    #[serde(default)]
    pub threshold: Option<f32>,
}

impl LabeledQuery {
    /// A labeled query using the default threshold.
    #[must_use]
    pub fn new(query: impl Into<String>, expected: Vec<EntityId>) -> Self {
        Self {
            query: query.into(),
            expected,
            threshold: None,
        }
    }

    /// Sets a threshold override.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Confusion counts with derived scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Counts {
    /// Returned and expected.
    pub true_positives: usize,
    /// Returned, not expected.
    pub false_positives: usize,
    /// Expected, not returned.
    pub false_negatives: usize,
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn harmonic(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl Counts {
    /// `tp / (tp + fp)`, zero when nothing was returned.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// `tp / (tp + fn)`, zero when nothing was expected.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall.
    #[must_use]
    pub fn f1(&self) -> f64 {
        harmonic(self.precision(), self.recall())
    }

    fn add(&mut self, other: Self) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }
}

/// Metrics for one labeled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetrics {
    /// Raw query text.
    pub query: String,
    /// Confusion counts.
    pub counts: Counts,
    /// Precision.
    pub precision: f64,
    /// Recall.
    pub recall: f64,
    /// F1.
    pub f1: f64,
    /// `1 / rank` of the first expected hit, zero if none was returned.
    pub reciprocal_rank: f64,
    /// Hits returned.
    pub returned: usize,
}

/// Mean precision, recall and F1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    /// Precision.
    pub precision: f64,
    /// Recall.
    pub recall: f64,
    /// F1.
    pub f1: f64,
}

/// Aggregate report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// One entry per labeled query, in input order.
    pub per_query: Vec<QueryMetrics>,
    /// Unweighted mean over queries.
    pub macro_avg: Averages,
    /// Scores over the summed confusion counts.
    pub micro_avg: Averages,
    /// Mean reciprocal rank.
    pub mean_reciprocal_rank: f64,
}

impl EvaluationReport {
    /// Queries answered with F1 of exactly 1.0.
    #[must_use]
    pub fn perfect_queries(&self) -> usize {
        self.per_query.iter().filter(|m| m.f1 >= 1.0).count()
    }
}

fn score_query(query: &str, expected: &[EntityId], predicted: &[EntityId]) -> QueryMetrics {
    let expected_set: HashSet<EntityId> = expected.iter().copied().collect();
    let predicted_set: HashSet<EntityId> = predicted.iter().copied().collect();

    let counts = Counts {
        true_positives: predicted_set.intersection(&expected_set).count(),
        false_positives: predicted_set.difference(&expected_set).count(),
        false_negatives: expected_set.difference(&predicted_set).count(),
    };
    #[allow(clippy::cast_precision_loss)]
    let reciprocal_rank = predicted
        .iter()
        .position(|id| expected_set.contains(id))
        .map_or(0.0, |i| 1.0 / (i + 1) as f64);

    QueryMetrics {
        query: query.to_string(),
        precision: counts.precision(),
        recall: counts.recall(),
        f1: counts.f1(),
        counts,
        reciprocal_rank,
        returned: predicted.len(),
    }
}

/// Aggregates per-query metrics.
#[must_use]
pub fn summarize(per_query: Vec<QueryMetrics>) -> EvaluationReport {
    if per_query.is_empty() {
        return EvaluationReport::default();
    }
    #[allow(clippy::cast_precision_loss)]
    let n = per_query.len() as f64;
    let mean = |f: fn(&QueryMetrics) -> f64| per_query.iter().map(f).sum::<f64>() / n;

    let mut total = Counts::default();
    for m in &per_query {
        total.add(m.counts);
    }

    EvaluationReport {
        macro_avg: Averages {
            precision: mean(|m| m.precision),
            recall: mean(|m| m.recall),
            f1: mean(|m| m.f1),
        },
        micro_avg: Averages {
            precision: total.precision(),
            recall: total.recall(),
            f1: total.f1(),
        },
        mean_reciprocal_rank: mean(|m| m.reciprocal_rank),
        per_query,
    }
}

/// Runs every labeled query and scores the returned ids.
///
/// `threshold` overrides the query type default for queries that carry no
/// override of their own.
///
/// # Errors
///
/// Stops at the first query that fails validation or embedding.
pub fn evaluate<H: EntityHandler>(
    resolver: &Resolver<H>,
    index: &EntityIndex<H::Parts>,
    queries: &[LabeledQuery],
    threshold: Option<f32>,
) -> PersonaResult<EvaluationReport> {
    let mut per_query = Vec::with_capacity(queries.len());
    for labeled in queries {
        let mut builder = SearchRequest::builder().query(labeled.query.as_str());
        if let Some(t) = labeled.threshold.or(threshold) {
            builder = builder.threshold(t);
        }
        let response = resolver.search(index, &builder.build()?)?;
        let predicted: Vec<EntityId> = response.hits.iter().map(|h| h.entity_id).collect();
        per_query.push(score_query(&labeled.query, &labeled.expected, &predicted));
    }

    let report = summarize(per_query);
    tracing::info!(
        queries = queries.len(),
        macro_f1 = report.macro_avg.f1,
        micro_f1 = report.micro_avg.f1,
        mrr = report.mean_reciprocal_rank,
        "evaluation complete"
    );
    Ok(report)
}
