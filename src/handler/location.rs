use crate::config::ResolverConfig;
use crate::lexical::{similarity, LexicalMatch};
use crate::name::normalize_token;
use crate::query::{Query, QueryType};
use crate::ranker::MatchKind;

use super::{contains_words, primary_segment, EntityHandler};

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("nyc", "new york city"),
    ("la", "los angeles"),
    ("sf", "san francisco"),
    ("dc", "washington dc"),
    ("uk", "united kingdom"),
    ("us", "united states"),
    ("usa", "united states"),
];

const SUFFIXES: &[&str] = &["city", "town", "village", "county", "state", "province"];

/// Decomposed location descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationParts {
    /// Location segment as written.
    pub full: String,
    /// First comma-separated component, e.g. the city.
    pub primary: String,
    /// Second component, e.g. the state or country.
    pub secondary: Option<String>,
    normalized: String,
    normalized_components: Vec<String>,
}

impl LocationParts {
    /// Normalized location text.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Normalized comma-separated components.
    #[must_use]
    pub fn normalized_components(&self) -> &[String] {
        &self.normalized_components
    }
}

/// Places: cities, regions, countries.
#[derive(Debug, Clone, Copy)]
pub struct LocationHandler {
    fuzzy_floor: f32,
    fuzzy_multiplier: f32,
    containment_score: f32,
    overlap_boost: f32,
}

impl Default for LocationHandler {
    fn default() -> Self {
        Self {
            fuzzy_floor: 0.85,
            fuzzy_multiplier: 0.95,
            containment_score: 0.9,
            overlap_boost: 1.2,
        }
    }
}

/// Case-folds, expands whole-word abbreviations and drops generic suffixes.
fn normalize_location(text: &str) -> String {
    let mut words = Vec::new();
    for token in text.split(|c: char| c.is_whitespace() || c == ',') {
        let token = normalize_token(token);
        if token.is_empty() {
            continue;
        }
        match ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == token) {
            Some((_, expansion)) => words.extend(expansion.split(' ').map(str::to_string)),
            None => words.push(token),
        }
    }
    words.retain(|w| !SUFFIXES.contains(&w.as_str()));
    words.join(" ")
}

impl EntityHandler for LocationHandler {
    type Parts = LocationParts;

    fn extract_parts(&self, descriptor: &str) -> LocationParts {
        let full = primary_segment(descriptor).to_string();
        let components: Vec<&str> = full
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        let normalized_components = components
            .iter()
            .map(|c| normalize_location(c))
            .filter(|c| !c.is_empty())
            .collect();

        LocationParts {
            primary: components.first().map(|c| (*c).to_string()).unwrap_or_default(),
            secondary: components.get(1).map(|c| (*c).to_string()),
            normalized: normalize_location(&full),
            normalized_components,
            full,
        }
    }

    fn is_unmatchable(&self, parts: &LocationParts) -> bool {
        parts.normalized.is_empty()
    }

    fn query_type(&self, raw: &str) -> QueryType {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            QueryType::Semantic
        } else if trimmed.split_whitespace().count() == 1 {
            QueryType::SingleToken
        } else if trimmed.contains(',') || trimmed.contains(" - ") {
            QueryType::FullName
        } else {
            QueryType::Semantic
        }
    }

    fn attempts_lexical(&self, _query_type: QueryType) -> bool {
        true
    }

    fn lexical_score(
        &self,
        query: &Query,
        parts: &LocationParts,
        config: &ResolverConfig,
    ) -> Option<LexicalMatch> {
        let q = normalize_location(query.raw());
        if q.is_empty() || parts.normalized.is_empty() {
            return None;
        }

        if q == parts.normalized || parts.normalized_components.contains(&q) {
            return Some(LexicalMatch {
                score: config.scores.exact,
                kind: MatchKind::Exact,
            });
        }
        if contains_words(&parts.normalized, &q) {
            return Some(LexicalMatch {
                score: self.containment_score,
                kind: MatchKind::Partial,
            });
        }

        let best = std::iter::once(&parts.normalized)
            .chain(&parts.normalized_components)
            .map(|candidate| similarity(&q, candidate))
            .fold(0.0_f32, f32::max);
        (best >= self.fuzzy_floor).then(|| LexicalMatch {
            score: self.fuzzy_multiplier * best,
            kind: MatchKind::Fuzzy,
        })
    }

    fn custom_score(&self, query: &Query, parts: &LocationParts, base: f32) -> f32 {
        let q = normalize_location(query.raw());
        let overlaps = q
            .split(' ')
            .any(|w| !w.is_empty() && parts.normalized.split(' ').any(|e| e == w));
        if overlaps {
            (base * self.overlap_boost).min(1.0)
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(query: &str, descriptor: &str) -> Option<LexicalMatch> {
        let handler = LocationHandler::default();
        let parts = handler.extract_parts(descriptor);
        handler.lexical_score(&handler.parse_query(query), &parts, &ResolverConfig::default())
    }

    #[test]
    fn normalization_expands_abbreviations_and_drops_suffixes() {
        assert_eq!(normalize_location("NYC"), "new york");
        assert_eq!(normalize_location("Salt Lake City, UT"), "salt lake ut");
        assert_eq!(normalize_location("Orange County"), "orange");
        // Only whole words are expanded.
        assert_eq!(normalize_location("Lausanne"), "lausanne");
    }

    #[test]
    fn parts_split_on_commas() {
        let parts = LocationHandler::default().extract_parts("Portland, Oregon - HQ");
        assert_eq!(parts.full, "Portland, Oregon");
        assert_eq!(parts.primary, "Portland");
        assert_eq!(parts.secondary.as_deref(), Some("Oregon"));
        assert_eq!(parts.normalized(), "portland oregon");
        assert_eq!(parts.normalized_components(), &["portland", "oregon"]);
    }

    #[test]
    fn abbreviation_matches_exactly() {
        let m = score("NYC", "New York City").unwrap();
        assert_eq!(m.kind, MatchKind::Exact);
        assert!((m.score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn component_matches_exactly() {
        let m = score("Portland", "Portland, Oregon").unwrap();
        assert_eq!(m.kind, MatchKind::Exact);
    }

    #[test]
    fn word_containment_is_partial() {
        let m = score("San Francisco", "San Francisco Bay Area").unwrap();
        assert_eq!(m.kind, MatchKind::Partial);
        assert!((m.score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn near_spellings_are_fuzzy() {
        let m = score("Pittsburg", "Pittsburgh").unwrap();
        assert_eq!(m.kind, MatchKind::Fuzzy);
        assert!((m.score - 0.95 * 0.9).abs() < 1e-6);
        assert!(score("Boston", "Austin").is_none());
    }

    #[test]
    fn query_types() {
        let handler = LocationHandler::default();
        assert_eq!(handler.query_type("Paris"), QueryType::SingleToken);
        assert_eq!(handler.query_type("Paris, France"), QueryType::FullName);
        assert_eq!(handler.query_type("city of lights"), QueryType::Semantic);
        assert_eq!(handler.query_type(""), QueryType::Semantic);
        assert!(handler.attempts_lexical(QueryType::Semantic));
    }

    #[test]
    fn shared_words_boost_semantic_scores() {
        let handler = LocationHandler::default();
        let parts = handler.extract_parts("Kansas City, Missouri");
        let near = handler.parse_query("somewhere in missouri");
        let far = handler.parse_query("somewhere in texas");
        assert!((handler.custom_score(&near, &parts, 0.5) - 0.6).abs() < 1e-6);
        assert!((handler.custom_score(&far, &parts, 0.5) - 0.5).abs() < 1e-6);
        assert!((handler.custom_score(&near, &parts, 0.9) - 1.0).abs() < 1e-6);
    }
}
