//! SEARCH request builder.

use crate::error::ValidationError;

/// A validated search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    query: String,
    threshold: Option<f32>,
    limit: Option<usize>,
}

impl SearchRequest {
    /// A request with the query type's default threshold and no limit.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            threshold: None,
            limit: None,
        }
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> SearchBuilder {
        SearchBuilder::new()
    }

    /// Raw query text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Threshold override, if any.
    #[must_use]
    pub const fn threshold(&self) -> Option<f32> {
        self.threshold
    }

    /// Maximum number of hits, if any.
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }
}

/// Builder for [`SearchRequest`].
///
/// # Example
/// ```
/// use persona::SearchRequest;
///
/// let request = SearchRequest::builder()
///     .query("John Smith")
///     .threshold(0.6)
///     .limit(5)
///     .build()
///     .unwrap();
/// assert_eq!(request.limit(), Some(5));
///
/// assert!(SearchRequest::builder().query("x").threshold(1.5).build().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchBuilder {
    query: Option<String>,
    threshold: Option<f32>,
    limit: Option<usize>,
}

impl SearchBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw query text (required; may be empty).
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Override the query type's default threshold (0.0 to 1.0).
    #[must_use]
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Keep only the top `limit` hits after sorting (default: all).
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - no query was set
    /// - the threshold is NaN or outside [0.0, 1.0]
    /// - the limit is zero
    pub fn build(self) -> Result<SearchRequest, ValidationError> {
        let Some(query) = self.query else {
            return Err(ValidationError::MissingField {
                field: "query".to_string(),
            });
        };

        if let Some(value) = self.threshold {
            // NaN fails the range check too.
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::ThresholdOutOfRange { value });
            }
        }

        if self.limit == Some(0) {
            return Err(ValidationError::InvalidLimit);
        }

        Ok(SearchRequest {
            query,
            threshold: self.threshold,
            limit: self.limit,
        })
    }
}
