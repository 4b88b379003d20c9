//! Embedding-based intent routing and similarity search.
//!
//! Two engines share one vector model:
//! - [`vector::VectorStore`]: a persisted key→vector store with cosine top-k queries
//! - [`routing::RouteClassifier`]: a threshold classifier over exemplar embeddings
//!
//! [`service::RoutingService`] wires them to the [`routing::Dispatcher`], which
//! names the external pipeline that should handle an utterance.

pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod retry;
pub mod routing;
pub mod service;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{
    CorpusError, CorpusResult, ErrorCategory, Retryable, ServiceError, StoreError, StoreResult,
};
pub use retry::RetryPolicy;
pub use routing::{
    ClassificationResult, ClassifierConfig, DispatchRequest, Dispatcher, Encoder, PipelineKey,
    Route, RouteCatalog, RouteClassifier, RouteCorpus, RouteOutcome,
};
pub use service::RoutingService;
pub use vector::{
    Dimension, Embedding, SimilarityMatch, StoreOptions, StoredItem, UpsertMode, VectorError,
    VectorStore,
};
