//! Error types for persona.
//!
//! All errors are strongly typed using thiserror. Structural problems inside
//! matching (missing name parts, empty middle lists) never surface here: they
//! are recovered locally. Only input-contract violations and embedding
//! provider failures propagate to the caller.

use thiserror::Error;

/// Validation errors raised at the search-call boundary, before any work runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Threshold {value} is out of range [0.0, 1.0]")]
    ThresholdOutOfRange {
        value: f32,
    },

    #[error("Result limit must be greater than zero")]
    InvalidLimit,

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Failures reported by an embedding provider.
///
/// These are never papered over with a zero vector: a query whose vector
/// cannot be computed fails as a whole.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding provider unavailable: {message}")]
    ProviderUnavailable {
        message: String,
    },

    #[error("Failed to encode text: {message}")]
    EncodingFailed {
        message: String,
    },

    #[error("Embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },
}

/// Execution errors from the concurrent search runtime.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Search queue '{path}' is full (capacity: {capacity})")]
    QueueFull {
        path: String,
        capacity: usize,
    },

    #[error("Search worker on '{path}' disconnected")]
    Disconnected {
        path: String,
    },

    #[error("Search timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Index unavailable: {message}")]
    IndexUnavailable {
        message: String,
    },
}

/// Top-level error type for persona.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl PersonaError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an embedding provider error.
    #[must_use]
    pub const fn is_embedding(&self) -> bool {
        matches!(self, Self::Embedding(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false, // Same input fails the same way
            Self::Embedding(e) => matches!(e, EmbeddingError::ProviderUnavailable { .. }),
            Self::Execution(e) => matches!(
                e,
                ExecutionError::QueueFull { .. } | ExecutionError::Timeout { .. }
            ),
            Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for persona operations.
pub type PersonaResult<T> = Result<T, PersonaError>;
