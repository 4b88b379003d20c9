//! Persisted embedding store with cosine top-k retrieval.
//!
//! Vectors live in a single append-only segment file that is memory-mapped
//! for reads. Queries are exhaustive: every live row is scored, so results are
//! exact and deterministic for a fixed store state.
//!
//! # Architecture
//! - `types`: validated `Embedding` and `Dimension` newtypes
//! - `similarity`: cosine scoring and the deterministic ranking order
//! - `storage`: the on-disk segment format and its commit protocol
//! - `store`: the async, lock-protected `VectorStore` handle

mod similarity;
mod storage;
mod store;
mod types;

// Re-export core types for public API
pub use similarity::cosine_similarity;
pub use storage::{MAX_KEY_BYTES, RowRef, SEGMENT_FILE_NAME, SegmentFile, StorageError};
pub use store::{StoreOptions, StoreStats, UpsertMode, VectorStore};
pub use types::{Dimension, Embedding, SimilarityMatch, StoredItem, VectorError};

pub(crate) use similarity::cosine_unchecked;
