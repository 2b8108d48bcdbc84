//! Tunable scoring constants.
//!
//! Every cutoff in the matcher is an empirically tuned default, not a derived
//! constant. They live here so they can be calibrated against a labeled query
//! set (see [`crate::evaluation`]) and loaded from any serde format.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::query::QueryType;

/// Scores assigned by the lexical rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    /// Full-name query equal to the entity's name, middles included.
    pub exact: f32,
    /// First and last equal, query middles a subsequence of entity middles.
    pub full_with_middle: f32,
    /// First and last equal, query middle initial matches an entity middle.
    pub initial_middle: f32,
    /// First and last equal, middles ignored.
    pub first_last: f32,
    /// Single token equal to the first or last name.
    pub token_exact: f32,
    /// Single letter equal to the first or last initial.
    pub token_initial: f32,
    /// Single token equal to a middle name.
    pub middle_exact: f32,
    /// Single letter equal to a middle initial.
    pub middle_initial: f32,
    /// Multiplier applied to fuzzy similarity.
    pub fuzzy_multiplier: f32,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            exact: 1.0,
            full_with_middle: 0.98,
            initial_middle: 0.96,
            first_last: 0.95,
            token_exact: 0.95,
            token_initial: 0.85,
            middle_exact: 0.90,
            middle_initial: 0.80,
            fuzzy_multiplier: 0.85,
        }
    }
}

impl ScoreTable {
    fn entries(&self) -> [(&'static str, f32); 9] {
        [
            ("exact", self.exact),
            ("full_with_middle", self.full_with_middle),
            ("initial_middle", self.initial_middle),
            ("first_last", self.first_last),
            ("token_exact", self.token_exact),
            ("token_initial", self.token_initial),
            ("middle_exact", self.middle_exact),
            ("middle_initial", self.middle_initial),
            ("fuzzy_multiplier", self.fuzzy_multiplier),
        ]
    }
}

/// Resolver configuration.
///
/// # Examples
///
/// ```
/// use persona::ResolverConfig;
///
/// let config: ResolverConfig = serde_json::from_str(r#"{"fuzzy_floor": 0.8}"#).unwrap();
/// assert_eq!(config.fuzzy_floor, 0.8);
/// assert_eq!(config.name_threshold, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Lexical rule scores.
    pub scores: ScoreTable,
    /// Minimum edit-distance similarity accepted as a typo.
    pub fuzzy_floor: f32,
    /// Factor applied to semantic scores for name-shaped queries.
    pub semantic_penalty: f32,
    /// Default threshold for single-token and full-name queries.
    pub name_threshold: f32,
    /// Default threshold for semantic queries.
    pub semantic_threshold: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            scores: ScoreTable::default(),
            fuzzy_floor: 0.75,
            semantic_penalty: 0.8,
            name_threshold: 0.5,
            semantic_threshold: 0.4,
        }
    }
}

impl ResolverConfig {
    /// Default threshold for a query type.
    #[must_use]
    pub const fn threshold_for(&self, query_type: QueryType) -> f32 {
        match query_type {
            QueryType::SingleToken | QueryType::FullName => self.name_threshold,
            QueryType::Semantic => self.semantic_threshold,
        }
    }

    /// Checks that every constant lies in [0.0, 1.0].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let top = [
            ("fuzzy_floor", self.fuzzy_floor),
            ("semantic_penalty", self.semantic_penalty),
            ("name_threshold", self.name_threshold),
            ("semantic_threshold", self.semantic_threshold),
        ];
        for (field, value) in top.into_iter().chain(self.scores.entries()) {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::InvalidConfig {
                    reason: format!("{field}={value} is outside [0.0, 1.0]"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ResolverConfig::default().validate().is_ok());
    }

    #[test]
    fn thresholds_follow_query_type() {
        let config = ResolverConfig::default();
        assert_eq!(config.threshold_for(QueryType::SingleToken), 0.5);
        assert_eq!(config.threshold_for(QueryType::FullName), 0.5);
        assert_eq!(config.threshold_for(QueryType::Semantic), 0.4);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut config = ResolverConfig::default();
        config.scores.first_last = 1.2;
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("first_last"));

        let config = ResolverConfig {
            fuzzy_floor: f32::NAN,
            ..ResolverConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_round_trip_keeps_overrides() {
        let mut config = ResolverConfig::default();
        config.scores.fuzzy_multiplier = 0.9;
        config.semantic_threshold = 0.35;

        let json = serde_json::to_string(&config).unwrap();
        let parsed: ResolverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let parsed: ResolverConfig =
            serde_json::from_str(r#"{"scores": {"exact": 0.99}}"#).unwrap();
        assert_eq!(parsed.scores.exact, 0.99);
        assert_eq!(parsed.scores.first_last, 0.95);
        assert_eq!(parsed.fuzzy_floor, 0.75);
    }
}
