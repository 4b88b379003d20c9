//! Error types for the routing and similarity engine
//!
//! Every public error can be placed in one of three categories so callers
//! (and monitoring) can tell a bad request from a flaky backend from a broken
//! deployment. Nothing here is ever folded into an empty result.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::vector::{StorageError, VectorError};

/// Coarse classification of every error this crate returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input. Permanent; retrying the same call cannot succeed.
    Input,
    /// Backend unavailable or too slow. Safe to retry with backoff.
    Transient,
    /// Deployment or data problem detected at startup or on open.
    Configuration,
}

impl ErrorCategory {
    /// Stable lowercase name, used in logs and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Transient => "transient",
            Self::Configuration => "configuration",
        }
    }
}

/// Implemented by errors that a caller-side retry loop can inspect.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Errors from `VectorStore` operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Input(#[from] VectorError),

    #[error("Vector store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Vector store {operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Vector store write was cancelled before commit")]
    Cancelled,

    #[error("Vector store is corrupted: {reason}")]
    Corrupted { reason: String },

    #[error(
        "Vector store at '{path}' holds {stored}-dimensional vectors but the encoder produces {configured}"
    )]
    DimensionConflict {
        path: PathBuf,
        stored: usize,
        configured: usize,
    },

    #[error("Unsupported vector store version {actual} (expected {expected})")]
    VersionMismatch { expected: u32, actual: u32 },
}

impl StoreError {
    /// Wraps a segment error, attaching the store path where it helps.
    pub(crate) fn from_storage(err: StorageError, path: &std::path::Path) -> Self {
        match err {
            StorageError::Io(e) => Self::Unavailable {
                reason: format!("{}: {e}", path.display()),
            },
            StorageError::InvalidFormat(reason) => Self::Corrupted { reason },
            StorageError::DimensionConflict { stored, configured } => Self::DimensionConflict {
                path: path.to_path_buf(),
                stored,
                configured,
            },
            StorageError::VersionMismatch { expected, actual } => {
                Self::VersionMismatch { expected, actual }
            }
            StorageError::Vector(e) => Self::Input(e),
            StorageError::Cancelled => Self::Cancelled,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Input(_) => ErrorCategory::Input,
            Self::Unavailable { .. } | Self::Timeout { .. } | Self::Cancelled => {
                ErrorCategory::Transient
            }
            Self::Corrupted { .. } | Self::DimensionConflict { .. } | Self::VersionMismatch { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    /// Get a stable status code for this error type.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Input(_) => "INVALID_INPUT",
            Self::Unavailable { .. } => "STORE_UNAVAILABLE",
            Self::Timeout { .. } => "STORE_TIMEOUT",
            Self::Cancelled => "STORE_CANCELLED",
            Self::Corrupted { .. } => "STORE_CORRUPTED",
            Self::DimensionConflict { .. } => "DIMENSION_CONFLICT",
            Self::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Unavailable { .. } => vec![
                "Check that the store directory exists and is writable",
                "Retry the operation with backoff",
            ],
            Self::Timeout { .. } => vec![
                "Retry the operation; a timed-out upsert may or may not have committed",
                "Raise store.timeout_ms if the store is large",
            ],
            Self::Corrupted { .. } => vec![
                "Restore the store directory from backup or re-index into a new directory",
            ],
            Self::DimensionConflict { .. } => vec![
                "Use a new store.path when switching embedding models",
                "Make store.dimension match the encoder output",
            ],
            _ => vec![],
        }
    }
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }
}

/// Errors building a route corpus. Always fatal at startup.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Route corpus is empty\nSuggestion: Declare at least one route in the corpus file")]
    Empty,

    #[error(
        "Route corpus has no exemplars\nSuggestion: Encode at least one utterance for some route"
    )]
    NoExemplars,

    #[error("Route name at position {position} is empty")]
    EmptyRouteName { position: usize },

    #[error("Route '{name}' is declared more than once")]
    DuplicateRoute { name: String },

    #[error("Exemplar {exemplar} of route '{route}' has dimension {actual}, corpus uses {expected}")]
    MixedDimensions {
        route: String,
        exemplar: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to read corpus file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse corpus file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Encoder failed while building the corpus: {reason}")]
    Encoder { reason: String },

    #[error("Encoder returned {actual} embeddings for {expected} utterances")]
    EncoderCount { expected: usize, actual: usize },
}

impl CorpusError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }

    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Read { .. } | Self::Parse { .. } => "CORPUS_UNREADABLE",
            Self::Encoder { .. } | Self::EncoderCount { .. } => "ENCODER_FAILED",
            _ => "INVALID_CORPUS",
        }
    }
}

impl Retryable for CorpusError {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Errors from the routing service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Classification failed: {0}")]
    Classify(#[from] VectorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(
        "Route corpus is {corpus}-dimensional but the vector store holds {store}-dimensional vectors\nSuggestion: Re-encode the corpus with the store's embedding model"
    )]
    DimensionConflict { corpus: usize, store: usize },
}

impl ServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Classify(_) => ErrorCategory::Input,
            Self::Store(e) => e.category(),
            Self::DimensionConflict { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Classify(_) => "INVALID_INPUT",
            Self::Store(e) => e.status_code(),
            Self::DimensionConflict { .. } => "DIMENSION_CONFLICT",
        }
    }
}

impl Retryable for ServiceError {
    fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }
}

impl Retryable for VectorError {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for corpus construction
pub type CorpusResult<T> = Result<T, CorpusError>;
