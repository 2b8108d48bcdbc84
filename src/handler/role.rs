use std::collections::BTreeSet;

use crate::config::ResolverConfig;
use crate::lexical::LexicalMatch;
use crate::name::normalize_token;
use crate::query::{Query, QueryType};
use crate::ranker::MatchKind;

use super::{contains_words, primary_segment, EntityHandler};

const LEVELS: &[&str] = &[
    "junior",
    "senior",
    "lead",
    "principal",
    "staff",
    "chief",
    "head",
    "director",
    "vp",
    "intern",
];

const DOMAINS: &[&str] = &[
    "software",
    "data",
    "product",
    "marketing",
    "sales",
    "finance",
    "operations",
    "engineering",
    "design",
    "research",
];

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("swe", "software engineer"),
    ("pm", "product manager"),
    ("eng", "engineer"),
];

const SYNONYMS: &[&[&str]] = &[
    &["developer", "engineer", "programmer"],
    &["manager", "lead", "head"],
    &["analyst", "specialist"],
    &["designer", "ux", "ui"],
];

/// Decomposed role descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleParts {
    /// Role segment as written.
    pub full: String,
    /// Seniority word, if any.
    pub level: Option<&'static str>,
    /// Functional domain word, if any.
    pub domain: Option<&'static str>,
    /// Remaining words, e.g. `"engineer"`.
    pub core: String,
    normalized: String,
}

impl RoleParts {
    /// Normalized role text.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// Work roles and job titles.
#[derive(Debug, Clone, Copy)]
pub struct RoleHandler {
    containment_score: f32,
    level_mismatch_penalty: f32,
    core_boost: f32,
}

impl Default for RoleHandler {
    fn default() -> Self {
        Self {
            containment_score: 0.9,
            level_mismatch_penalty: 0.8,
            core_boost: 1.1,
        }
    }
}

fn normalize_role(text: &str) -> String {
    let mut words = Vec::new();
    for token in text.split_whitespace() {
        let token = normalize_token(token);
        if token.is_empty() {
            continue;
        }
        match ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == token) {
            Some((_, expansion)) => words.extend(expansion.split(' ').map(str::to_string)),
            None => words.push(token),
        }
    }
    words.join(" ")
}

fn find_in(words: &[&str], table: &[&'static str]) -> Option<&'static str> {
    words
        .iter()
        .find_map(|w| table.iter().copied().find(|t| t == w))
}

fn decompose(full: String) -> RoleParts {
    let normalized = normalize_role(&full);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
    let level = find_in(&words, LEVELS);
    let domain = find_in(&words, DOMAINS);
    let core = words
        .iter()
        .copied()
        .filter(|w| Some(*w) != level && Some(*w) != domain)
        .collect::<Vec<_>>()
        .join(" ");
    RoleParts {
        full,
        level,
        domain,
        core,
        normalized,
    }
}

/// The query plus every single-word synonym substitution.
fn variations(normalized: &str) -> BTreeSet<String> {
    let words: Vec<&str> = normalized.split(' ').collect();
    let mut out = BTreeSet::new();
    out.insert(normalized.to_string());
    for (i, word) in words.iter().enumerate() {
        let Some(group) = SYNONYMS.iter().find(|g| g.contains(word)) else {
            continue;
        };
        for alt in group.iter().filter(|alt| *alt != word) {
            let mut swapped = words.clone();
            swapped[i] = *alt;
            out.insert(swapped.join(" "));
        }
    }
    out
}

impl EntityHandler for RoleHandler {
    type Parts = RoleParts;

    fn extract_parts(&self, descriptor: &str) -> RoleParts {
        decompose(primary_segment(descriptor).to_string())
    }

    fn is_unmatchable(&self, parts: &RoleParts) -> bool {
        parts.normalized.is_empty()
    }

    fn query_type(&self, raw: &str) -> QueryType {
        let normalized = normalize_role(raw);
        let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
        if words.is_empty() {
            QueryType::Semantic
        } else if words.len() == 1 {
            QueryType::SingleToken
        } else if find_in(&words, LEVELS).is_some() || find_in(&words, DOMAINS).is_some() {
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
        parts: &RoleParts,
        config: &ResolverConfig,
    ) -> Option<LexicalMatch> {
        let q = normalize_role(query.raw());
        if q.is_empty() || parts.normalized.is_empty() {
            return None;
        }
        let candidates = variations(&q);

        if candidates.contains(&parts.normalized) {
            return Some(LexicalMatch {
                score: config.scores.exact,
                kind: MatchKind::Exact,
            });
        }
        candidates
            .iter()
            .any(|c| contains_words(&parts.normalized, c))
            .then_some(LexicalMatch {
                score: self.containment_score,
                kind: MatchKind::Partial,
            })
    }

    fn custom_score(&self, query: &Query, parts: &RoleParts, base: f32) -> f32 {
        let q = decompose(query.raw().to_string());
        let mut score = base;
        if let (Some(ql), Some(el)) = (q.level, parts.level) {
            if ql != el {
                score *= self.level_mismatch_penalty;
            }
        }
        if !q.core.is_empty() && q.core == parts.core {
            score *= self.core_boost;
        }
        score.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(query: &str, descriptor: &str) -> Option<LexicalMatch> {
        let handler = RoleHandler::default();
        let parts = handler.extract_parts(descriptor);
        handler.lexical_score(&handler.parse_query(query), &parts, &ResolverConfig::default())
    }

    #[test]
    fn decomposition_finds_level_and_domain() {
        let parts = RoleHandler::default().extract_parts("Senior Software Engineer at Acme");
        assert_eq!(parts.full, "Senior Software Engineer");
        assert_eq!(parts.level, Some("senior"));
        assert_eq!(parts.domain, Some("software"));
        assert_eq!(parts.core, "engineer");
        assert_eq!(parts.normalized(), "senior software engineer");
    }

    #[test]
    fn abbreviations_expand() {
        assert_eq!(normalize_role("Senior SWE"), "senior software engineer");
        assert_eq!(normalize_role("PM"), "product manager");
    }

    #[test]
    fn synonyms_produce_exact_matches() {
        let m = score("Senior Software Developer", "Senior Software Engineer").unwrap();
        assert_eq!(m.kind, MatchKind::Exact);
        let m = score("senior swe", "Senior Software Engineer").unwrap();
        assert_eq!(m.kind, MatchKind::Exact);
    }

    #[test]
    fn contained_roles_are_partial() {
        let m = score("Software Engineer", "Senior Software Engineer").unwrap();
        assert_eq!(m.kind, MatchKind::Partial);
        assert!((m.score - 0.9).abs() < 1e-6);
        assert!(score("Accountant", "Senior Software Engineer").is_none());
    }

    #[test]
    fn variations_swap_one_word_at_a_time() {
        let v = variations("data analyst");
        assert!(v.contains("data analyst"));
        assert!(v.contains("data specialist"));
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn level_mismatch_is_penalised_and_core_match_boosted() {
        let handler = RoleHandler::default();
        let parts = handler.extract_parts("Junior Data Engineer");
        let senior = handler.parse_query("senior data engineer");
        // Penalty and boost both apply: 0.5 * 0.8 * 1.1.
        assert!((handler.custom_score(&senior, &parts, 0.5) - 0.44).abs() < 1e-6);

        let plain = handler.parse_query("engineer");
        assert!((handler.custom_score(&plain, &parts, 0.5) - 0.55).abs() < 1e-6);
        assert!((handler.custom_score(&plain, &parts, 0.95) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn query_types() {
        let handler = RoleHandler::default();
        assert_eq!(handler.query_type("Engineer"), QueryType::SingleToken);
        assert_eq!(handler.query_type("senior engineer"), QueryType::FullName);
        assert_eq!(handler.query_type("someone who builds bridges"), QueryType::Semantic);
        // "swe" expands to two words, one of them a domain.
        assert_eq!(handler.query_type("swe"), QueryType::FullName);
    }
}
