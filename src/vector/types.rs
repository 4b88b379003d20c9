//! Type-safe wrappers and core types for embedding vectors.
//!
//! Embeddings are produced by an external encoder; everything in this crate
//! treats them as immutable values that must agree on a single dimension.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Type-safe wrapper for vector dimensions.
///
/// Ensures runtime validation of vector dimensions to prevent
/// dimension mismatches during comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimension(usize);

impl Dimension {
    /// Creates a new `Dimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable embedding vector.
///
/// Cheap to clone: the components live behind an `Arc<[f32]>`. Construction
/// rejects empty vectors and non-finite components, so every score computed
/// from two embeddings is a real number.
#[derive(Clone, PartialEq)]
pub struct Embedding(Arc<[f32]>);

impl Embedding {
    /// Creates an embedding from raw components.
    pub fn new(values: Vec<f32>) -> Result<Self, VectorError> {
        if values.is_empty() {
            return Err(VectorError::EmptyVector);
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(VectorError::NonFinite { index });
        }
        Ok(Self(values.into()))
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed embedding; kept for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dimension of this embedding.
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        Dimension(self.0.len())
    }

    /// Borrow the components.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Euclidean norm, accumulated in `f64` so large or tiny components
    /// neither overflow nor vanish.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.0
            .iter()
            .map(|&x| f64::from(x) * f64::from(x))
            .sum::<f64>()
            .sqrt()
    }
}

impl fmt::Debug for Embedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 4;
        let head: Vec<f32> = self.0.iter().take(PREVIEW).copied().collect();
        f.debug_struct("Embedding")
            .field("dimension", &self.0.len())
            .field("head", &head)
            .finish()
    }
}

impl TryFrom<Vec<f32>> for Embedding {
    type Error = VectorError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl Serialize for Embedding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Embedding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<f32>::deserialize(deserializer)?;
        Self::new(values).map_err(serde::de::Error::custom)
    }
}

/// A keyed vector to be written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    /// Semantic identifier, e.g. an asset symbol.
    pub key: String,
    /// The embedding for this key.
    pub vector: Embedding,
}

impl StoredItem {
    pub fn new(key: impl Into<String>, vector: Embedding) -> Self {
        Self {
            key: key.into(),
            vector,
        }
    }
}

/// A ranked query hit. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub key: String,
    /// Cosine similarity in [-1.0, 1.0].
    pub score: f32,
}

/// Errors caused by malformed vectors or query parameters.
///
/// These are permanent: retrying the same call cannot succeed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error("Empty vector\nSuggestion: The encoder must return at least one component")]
    EmptyVector,

    #[error("Vector component {index} is NaN or infinite")]
    NonFinite { index: usize },

    #[error("Query vector has zero magnitude; cosine similarity is undefined")]
    ZeroMagnitude,

    #[error("top_k must be positive")]
    InvalidTopK,

    #[error("Empty batch\nSuggestion: Pass at least one item to upsert")]
    EmptyBatch,

    #[error("Invalid key: {reason}")]
    InvalidKey { reason: &'static str },
}
