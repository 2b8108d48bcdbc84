//! Lexical name matching.
//!
//! The score hierarchy is an ordered rule table per query type. Rules are
//! evaluated top-down and the first one that fires wins; no rule ever takes a
//! maximum over later rules. A missing name part never satisfies a rule.

use crate::config::ResolverConfig;
use crate::name::NameParts;
use crate::query::{Query, QueryType};
use crate::ranker::MatchKind;

/// Score and kind produced by a lexical rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalMatch {
    /// Score in [0.0, 1.0].
    pub score: f32,
    /// Which rule produced the score.
    pub kind: MatchKind,
}

/// Normalized edit-distance similarity in [0.0, 1.0].
///
/// Uses optimal-alignment Damerau-Levenshtein, so a single adjacent
/// transposition counts as one edit (`"jhon"` vs `"john"` is 0.75).
#[must_use]
pub fn similarity(a: &str, b: &str) -> f32 {
    #[allow(clippy::cast_possible_truncation)]
    let sim = strsim::normalized_damerau_levenshtein(a, b) as f32;
    sim
}

/// Inputs shared by every rule.
struct RuleInput<'a> {
    tokens: &'a [String],
    parts: &'a NameParts,
    config: &'a ResolverConfig,
}

impl RuleInput<'_> {
    fn single(&self) -> &str {
        &self.tokens[0]
    }

    fn query_first(&self) -> &str {
        &self.tokens[0]
    }

    fn query_last(&self) -> &str {
        &self.tokens[self.tokens.len() - 1]
    }

    fn query_middle(&self) -> &[String] {
        &self.tokens[1..self.tokens.len() - 1]
    }

    fn first_and_last_equal(&self) -> bool {
        self.parts.first_key() == Some(self.query_first())
            && self.parts.last_key() == Some(self.query_last())
    }
}

/// One row of the score table.
pub struct LexicalRule {
    /// Stable rule name, for diagnostics.
    pub name: &'static str,
    /// Kind reported when the rule fires.
    pub kind: MatchKind,
    eval: fn(&RuleInput<'_>) -> Option<f32>,
}

impl LexicalRule {
    fn apply(&self, input: &RuleInput<'_>) -> Option<LexicalMatch> {
        (self.eval)(input).map(|score| LexicalMatch {
            score,
            kind: self.kind,
        })
    }
}

impl std::fmt::Debug for LexicalRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexicalRule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// True when `needle` appears in `haystack` in order, gaps allowed.
fn is_subsequence<T: PartialEq>(needle: &[T], haystack: &[T]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|n| rest.any(|h| h == n))
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn first_or_last_exact(i: &RuleInput<'_>) -> Option<f32> {
    let q = Some(i.single());
    (i.parts.first_key() == q || i.parts.last_key() == q).then_some(i.config.scores.token_exact)
}

fn first_or_last_initial(i: &RuleInput<'_>) -> Option<f32> {
    let c = single_char(i.single())?;
    (i.parts.first_initial_key() == Some(c) || i.parts.last_initial_key() == Some(c))
        .then_some(i.config.scores.token_initial)
}

fn middle_exact(i: &RuleInput<'_>) -> Option<f32> {
    let q = i.single();
    i.parts
        .middle_keys()
        .iter()
        .any(|m| m.as_str() == q)
        .then_some(i.config.scores.middle_exact)
}

fn middle_initial(i: &RuleInput<'_>) -> Option<f32> {
    let c = single_char(i.single())?;
    let mut initials = i.parts.middle_initial_keys();
    initials.any(|m| m == c).then_some(i.config.scores.middle_initial)
}

fn first_or_last_fuzzy(i: &RuleInput<'_>) -> Option<f32> {
    let q = i.single();
    let best = [i.parts.first_key(), i.parts.last_key()]
        .into_iter()
        .flatten()
        .map(|name| similarity(q, name))
        .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))))?;
    (best >= i.config.fuzzy_floor).then(|| i.config.scores.fuzzy_multiplier * best)
}

fn exact(i: &RuleInput<'_>) -> Option<f32> {
    let keys = i.parts.keys();
    (keys.len() == i.tokens.len() && keys.iter().zip(i.tokens).all(|(k, t)| *k == t.as_str()))
        .then_some(i.config.scores.exact)
}

fn full_with_middle(i: &RuleInput<'_>) -> Option<f32> {
    let middle = i.query_middle();
    (i.first_and_last_equal() && !middle.is_empty() && is_subsequence(middle, i.parts.middle_keys()))
        .then_some(i.config.scores.full_with_middle)
}

fn initial_middle(i: &RuleInput<'_>) -> Option<f32> {
    let middle = i.query_middle();
    if !i.first_and_last_equal() || middle.is_empty() {
        return None;
    }
    let entity_initials: Vec<char> = i.parts.middle_initial_keys().collect();

    // "John M Smith" against "John Michael Smith".
    let query_letters: Option<Vec<char>> = middle.iter().map(|m| single_char(m)).collect();
    let query_abbreviated = query_letters.is_some_and(|q| is_subsequence(&q, &entity_initials));

    // "John Michael Smith" against "John M. Smith".
    let entity_letters: Option<Vec<char>> =
        i.parts.middle_keys().iter().map(|m| single_char(m)).collect();
    let entity_abbreviated = entity_letters.is_some_and(|e| {
        let query_initials: Vec<char> = middle.iter().filter_map(|m| m.chars().next()).collect();
        !e.is_empty() && e == query_initials
    });

    (query_abbreviated || entity_abbreviated).then_some(i.config.scores.initial_middle)
}

fn first_last(i: &RuleInput<'_>) -> Option<f32> {
    i.first_and_last_equal().then_some(i.config.scores.first_last)
}

fn first_last_fuzzy(i: &RuleInput<'_>) -> Option<f32> {
    let first = similarity(i.query_first(), i.parts.first_key()?);
    let last = similarity(i.query_last(), i.parts.last_key()?);
    let floor = i.config.fuzzy_floor;
    (first >= floor && last >= floor).then(|| i.config.scores.fuzzy_multiplier * first.min(last))
}

/// Rules for a single-token query, highest priority first.
pub const SINGLE_TOKEN_RULES: &[LexicalRule] = &[
    LexicalRule {
        name: "first_or_last_exact",
        kind: MatchKind::Exact,
        eval: first_or_last_exact,
    },
    LexicalRule {
        name: "first_or_last_initial",
        kind: MatchKind::Initial,
        eval: first_or_last_initial,
    },
    LexicalRule {
        name: "middle_exact",
        kind: MatchKind::MiddleExact,
        eval: middle_exact,
    },
    LexicalRule {
        name: "middle_initial",
        kind: MatchKind::Initial,
        eval: middle_initial,
    },
    LexicalRule {
        name: "first_or_last_fuzzy",
        kind: MatchKind::Fuzzy,
        eval: first_or_last_fuzzy,
    },
];

/// Rules for a full-name query, highest priority first.
pub const FULL_NAME_RULES: &[LexicalRule] = &[
    LexicalRule {
        name: "exact",
        kind: MatchKind::Exact,
        eval: exact,
    },
    LexicalRule {
        name: "full_with_middle",
        kind: MatchKind::FullWithMiddle,
        eval: full_with_middle,
    },
    LexicalRule {
        name: "initial_middle",
        kind: MatchKind::InitialMiddle,
        eval: initial_middle,
    },
    LexicalRule {
        name: "first_last",
        kind: MatchKind::FirstLast,
        eval: first_last,
    },
    LexicalRule {
        name: "first_last_fuzzy",
        kind: MatchKind::Fuzzy,
        eval: first_last_fuzzy,
    },
];

/// Rule table for a query type; semantic queries have none.
#[must_use]
pub fn rules_for(query_type: QueryType) -> &'static [LexicalRule] {
    match query_type {
        QueryType::SingleToken => SINGLE_TOKEN_RULES,
        QueryType::FullName => FULL_NAME_RULES,
        QueryType::Semantic => &[],
    }
}

/// Lexical matcher for person names.
#[derive(Debug, Clone, Copy)]
pub struct LexicalMatcher<'a> {
    config: &'a ResolverConfig,
}

impl<'a> LexicalMatcher<'a> {
    /// Creates a matcher over the given score table.
    #[must_use]
    pub const fn new(config: &'a ResolverConfig) -> Self {
        Self { config }
    }

    /// Scores query tokens against an entity's name parts.
    ///
    /// Returns `None` when no rule fires, which is distinct from a zero score:
    /// the caller falls through to semantic scoring.
    #[must_use]
    pub fn score(&self, query: &Query, parts: &NameParts) -> Option<LexicalMatch> {
        self.score_tokens(query.query_type(), query.tokens(), parts)
    }

    /// Scores pre-normalized tokens under an explicit query type.
    #[must_use]
    pub fn score_tokens(
        &self,
        query_type: QueryType,
        tokens: &[String],
        parts: &NameParts,
    ) -> Option<LexicalMatch> {
        let shape_ok = match query_type {
            QueryType::SingleToken => tokens.len() == 1,
            QueryType::FullName => tokens.len() >= 2,
            QueryType::Semantic => false,
        };
        if !shape_ok || parts.is_empty() {
            return None;
        }

        let input = RuleInput {
            tokens,
            parts,
            config: self.config,
        };
        rules_for(query_type).iter().find_map(|rule| rule.apply(&input))
    }

    /// Name of the first rule that fires, for diagnostics.
    #[must_use]
    pub fn explain(&self, query: &Query, parts: &NameParts) -> Option<&'static str> {
        let tokens = query.tokens();
        if self.score(query, parts).is_none() {
            return None;
        }
        let input = RuleInput {
            tokens,
            parts,
            config: self.config,
        };
        rules_for(query.query_type())
            .iter()
            .find(|rule| rule.apply(&input).is_some())
            .map(|rule| rule.name)
    }
}
