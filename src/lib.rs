//! # persona - fuzzy person-name resolution
//!
//! Resolves a free-text name query against an in-memory catalog of entities
//! and returns the ranked subset the query plausibly refers to. Matching is
//! tolerant of initials, missing middle names, letter case and small typos,
//! and falls back to embedding similarity for descriptive queries.
//!
//! ## Core Concepts
//!
//! - **Entity**: an opaque id plus a raw descriptor such as
//!   `"John M. Smith - Professor at MIT"`
//! - **NameParts**: first, middle and last tokens parsed from the descriptor
//! - **QueryType**: `single_token`, `full_name` or `semantic`, which selects
//!   the lexical rule table and the default threshold
//! - **EntityIndex**: an immutable, pre-parsed and pre-embedded catalog
//!
//! Every entity gets exactly one score per query: an ordered lexical rule
//! table first, cosine similarity against its descriptor vector otherwise.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use persona::{Entity, HashingEmbedder, MatchKind, Resolver};
//!
//! let resolver = Resolver::new(Arc::new(HashingEmbedder::default()));
//! let index = resolver.build_index(vec![
//!     Entity::keyed("e1", "John Smith - Software Engineer"),
//!     Entity::keyed("e2", "John Michael Smith - Professor"),
//!     Entity::keyed("e3", "Jane Doe - Product Manager"),
//! ])?;
//!
//! let hits = resolver.search_str(&index, "john m smith", None)?;
//! assert_eq!(hits[0].descriptor, "John Michael Smith - Professor");
//! assert_eq!(hits[0].match_kind, MatchKind::InitialMiddle);
//! # Ok::<(), persona::PersonaError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod entity;
pub mod error;
pub mod name;
pub mod query;

// Matching and ranking
pub mod embedding;
pub mod handler;
pub mod index;
pub mod lexical;
pub mod ranker;
pub mod semantic;

// Execution
pub mod engine;
pub mod operations;

// Post-processing
pub mod evaluation;
pub mod rerank;

// Re-export primary types at crate root for convenience
pub use config::{ResolverConfig, ScoreTable};
pub use embedding::{cosine_similarity, Embedder, HashingEmbedder, DEFAULT_EMBEDDING_DIM};
pub use entity::{Entity, EntityId, EntityType};
pub use error::{EmbeddingError, ExecutionError, PersonaError, PersonaResult, ValidationError};
pub use name::{NameParts, ParsedDescriptor};
pub use query::{classify, Query, QueryType};

pub use handler::{
    AnyHandler, AnyParts, EntityHandler, LocationHandler, LocationParts, PersonHandler,
    RoleHandler, RoleParts,
};
pub use index::{build_index, EntityIndex, IndexHandle, IndexedEntity};
pub use lexical::{LexicalMatch, LexicalMatcher};
pub use ranker::{MatchKind, MatchResult, ScoreCombiner};
pub use semantic::SemanticScorer;

pub use engine::runtime::{
    DefaultRouter, QueryRouter, SearchHandle, SearchPath, SearchRuntime, SearchRuntimeConfig,
};
pub use engine::{Resolution, Resolver, SearchHit, SearchResponse};
pub use operations::{SearchBuilder, SearchRequest};

pub use evaluation::{evaluate, EvaluationReport, LabeledQuery, QueryMetrics};
pub use rerank::{rerank_top_k, should_rerank, FeatureReranker, RerankedHit, Reranker};
