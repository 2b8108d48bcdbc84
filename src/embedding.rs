//! Embedding provider interface and the default deterministic provider.
//!
//! The engine treats the embedding model as a black box: text in, fixed-length
//! vector out. [`HashingEmbedder`] is an offline, dependency-light baseline
//! using feature hashing over tokens. It is *not* a neural model, but it is
//! deterministic and good enough for the semantic fallback on descriptor
//! context words ("engineer", "professor").

use blake3::Hasher;

use crate::error::EmbeddingError;

/// Default embedding dimensionality for hashed embeddings.
pub const DEFAULT_EMBEDDING_DIM: usize = 256;

/// A text embedding provider.
///
/// Implementations must be deterministic for a given model version and must
/// return vectors of [`Embedder::dimension`] length for every input, queries
/// and descriptors alike.
pub trait Embedder: Send + Sync {
    /// Embeds a piece of text.
    ///
    /// # Errors
    ///
    /// Returns an [`EmbeddingError`] when the model is unavailable or the text
    /// cannot be encoded.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Fixed output dimensionality.
    fn dimension(&self) -> usize;

    /// Embeds text and checks the output length against [`Embedder::dimension`].
    ///
    /// # Errors
    ///
    /// Propagates provider errors and reports wrong-length vectors as
    /// [`EmbeddingError::DimensionMismatch`].
    fn embed_checked(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let vector = self.embed(text)?;
        if vector.len() != self.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension(),
                actual: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::EncodingFailed {
                message: "embedding contains non-finite values".to_string(),
            });
        }
        Ok(vector)
    }
}

fn tokenize(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// Deterministic feature-hashing embedder.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    /// Creates an embedder with [`DEFAULT_EMBEDDING_DIM`] dimensions.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dim: DEFAULT_EMBEDDING_DIM,
        }
    }

    /// Creates an embedder with a custom dimension.
    #[must_use]
    pub const fn with_dim(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dim == 0 {
            return Err(EmbeddingError::ProviderUnavailable {
                message: "hashing embedder configured with zero dimensions".to_string(),
            });
        }
        Ok(hashed_embedding(text, self.dim))
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

/// Create a deterministic hashed embedding with the given dimension.
///
/// Text is lower-cased before hashing, so the result is case-insensitive.
#[must_use]
pub fn hashed_embedding(text: &str, dim: usize) -> Vec<f32> {
    if dim == 0 {
        return Vec::new();
    }

    let mut vec = vec![0.0f32; dim];
    let mut count = 0u32;

    for token in tokenize(&text.to_lowercase()) {
        let mut h = Hasher::new();
        h.update(token.as_bytes());
        let hash = h.finalize();

        let bytes = hash.as_bytes();
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&bytes[..8]);
        let bucket = u64::from_le_bytes(bucket_bytes);

        #[allow(clippy::cast_possible_truncation)]
        let idx = (bucket % dim as u64) as usize;
        let sign = if (bytes[8] & 1) == 0 { 1.0f32 } else { -1.0f32 };
        vec[idx] += sign;
        count = count.saturating_add(1);
    }

    if count == 0 {
        return vec;
    }

    // L2-normalize.
    let mut norm2 = 0.0f64;
    for &x in &vec {
        norm2 += f64::from(x) * f64::from(x);
    }
    if norm2 > 0.0 {
        let inv = (norm2.sqrt()).recip();
        #[allow(clippy::cast_possible_truncation)]
        let invf = inv as f32;
        for x in &mut vec {
            *x *= invf;
        }
    }

    vec
}

/// Cosine similarity between two vectors of equal length.
///
/// Zero-norm vectors have similarity 0.0 with everything.
///
/// # Errors
///
/// Returns [`EmbeddingError::DimensionMismatch`] when lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: b.len(),
            actual: a.len(),
        });
    }
    if a.is_empty() {
        return Ok(0.0);
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let xf = f64::from(x);
        let yf = f64::from(y);
        dot += xf * yf;
        norm_a += xf * xf;
        norm_b += yf * yf;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return Ok(0.0);
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if sim.is_finite() {
        #[allow(clippy::cast_possible_truncation)]
        Ok(sim as f32)
    } else {
        Ok(0.0)
    }
}
