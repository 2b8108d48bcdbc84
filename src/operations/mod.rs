//! Request builders.
//!
//! Builders validate inputs before any scoring runs, so a bad threshold or
//! limit never reaches the embedding provider.

mod search;

pub use search::{SearchBuilder, SearchRequest};
