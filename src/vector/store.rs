//! Durable key→vector store with cosine top-k retrieval.
//!
//! `VectorStore` is the shared, cloneable handle used by request handlers.
//! The segment file sits behind a `parking_lot::RwLock`: writers serialize in
//! submission order, readers rank over a consistent snapshot. Blocking file
//! work runs on tokio's blocking pool so every call can be bounded by a
//! timeout without stalling the async runtime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::vector::similarity::{Candidate, ensure_nonzero, rank_top_k};
use crate::vector::storage::{RowRef, SegmentFile, StorageError, validate_key};
use crate::vector::types::{Dimension, Embedding, SimilarityMatch, StoredItem, VectorError};

/// What `upsert` does when a key is written more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertMode {
    /// Every row is kept and ranked on its own; keys may repeat in results.
    #[default]
    Append,
    /// The most recent row for a key hides all earlier rows for that key.
    Replace,
}

/// Options for opening a store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub dimension: Dimension,
    pub mode: UpsertMode,
    /// Default timeout for `upsert` and `query`.
    pub timeout: Duration,
    /// Call `sync_data` before acknowledging a write.
    pub sync_writes: bool,
}

impl StoreOptions {
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            mode: UpsertMode::default(),
            timeout: Duration::from_secs(5),
            sync_writes: true,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: UpsertMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }
}

/// Snapshot of store counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub path: PathBuf,
    pub dimension: usize,
    pub mode: UpsertMode,
    /// Committed rows, including superseded ones.
    pub rows: usize,
    /// Rows that take part in ranking under the current mode.
    pub live_rows: usize,
    pub distinct_keys: usize,
    pub file_size: u64,
}

/// Shared handle to a persisted vector store.
#[derive(Clone)]
pub struct VectorStore {
    segment: Arc<RwLock<SegmentFile>>,
    path: PathBuf,
    dimension: Dimension,
    mode: UpsertMode,
    timeout: Duration,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("path", &self.path)
            .field("dimension", &self.dimension)
            .field("mode", &self.mode)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl VectorStore {
    /// Opens the store in `dir`, creating an empty one if needed.
    ///
    /// Fails with a configuration error if the existing data was written with
    /// a different dimension.
    pub fn open(dir: impl AsRef<Path>, options: StoreOptions) -> StoreResult<Self> {
        let dir = dir.as_ref();
        let segment = SegmentFile::open_or_create(dir, options.dimension, options.sync_writes)
            .map_err(|e| StoreError::from_storage(e, dir))?;

        Ok(Self {
            segment: Arc::new(RwLock::new(segment)),
            path: dir.to_path_buf(),
            dimension: options.dimension,
            mode: options.mode,
            timeout: options.timeout,
        })
    }

    /// Writes a batch of items using the default timeout.
    ///
    /// Returns the number of rows written. When this returns `Ok`, every
    /// later query from any caller sees the new rows.
    pub async fn upsert(&self, items: Vec<StoredItem>) -> StoreResult<usize> {
        self.upsert_with_timeout(items, self.timeout).await
    }

    /// Writes a batch of items, giving up after `timeout`.
    ///
    /// Input is validated before the backend is touched. On timeout the write
    /// is cancelled if it has not reached its commit step yet; a write that
    /// already committed stays committed, so callers must treat
    /// `StoreError::Timeout` from an upsert as "outcome unknown".
    pub async fn upsert_with_timeout(
        &self,
        items: Vec<StoredItem>,
        timeout: Duration,
    ) -> StoreResult<usize> {
        self.validate_batch(&items)?;
        let count = items.len();

        let token = CancellationToken::new();
        let task_token = token.clone();
        let segment = Arc::clone(&self.segment);
        let task = tokio::task::spawn_blocking(move || {
            segment.write().append_batch(&items, Some(&task_token))
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => {
                self.storage_result(joined)?;
                debug!(rows = count, mode = ?self.mode, "upsert committed");
                Ok(count)
            }
            Err(_) => {
                token.cancel();
                warn!(rows = count, ?timeout, "upsert timed out");
                Err(StoreError::Timeout {
                    operation: "upsert",
                    timeout,
                })
            }
        }
    }

    /// Returns the `top_k` most similar rows using the default timeout.
    pub async fn query(&self, vector: &Embedding, top_k: usize) -> StoreResult<Vec<SimilarityMatch>> {
        self.query_with_timeout(vector, top_k, self.timeout).await
    }

    /// Returns the `top_k` most similar rows, giving up after `timeout`.
    ///
    /// Results are sorted by descending cosine similarity; equal scores keep
    /// insertion order. An empty store yields `Ok(vec![])`; an unreachable
    /// one yields an error.
    pub async fn query_with_timeout(
        &self,
        vector: &Embedding,
        top_k: usize,
        timeout: Duration,
    ) -> StoreResult<Vec<SimilarityMatch>> {
        if top_k == 0 {
            return Err(VectorError::InvalidTopK.into());
        }
        self.dimension.validate_vector(vector.as_slice())?;
        ensure_nonzero(vector)?;

        let segment = Arc::clone(&self.segment);
        let query = vector.clone();
        let mode = self.mode;
        let task = tokio::task::spawn_blocking(move || {
            let segment = segment.read();
            rank_segment(&segment, &query, top_k, mode)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => {
                let matches = self.storage_result(joined)?;
                debug!(top_k, returned = matches.len(), "query ranked");
                Ok(matches)
            }
            Err(_) => {
                warn!(top_k, ?timeout, "query timed out");
                Err(StoreError::Timeout {
                    operation: "query",
                    timeout,
                })
            }
        }
    }

    /// Counts rows and keys. Reads the whole segment.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let segment = self.segment.read();
        let rows: Vec<RowRef<'_>> = segment
            .rows()
            .collect::<Result<_, _>>()
            .map_err(|e| StoreError::from_storage(e, &self.path))?;

        let mut distinct: HashMap<&str, usize> = HashMap::new();
        for row in &rows {
            *distinct.entry(row.key).or_default() += 1;
        }
        let live_rows = match self.mode {
            UpsertMode::Append => rows.len(),
            UpsertMode::Replace => distinct.len(),
        };
        let file_size = segment
            .file_size()
            .map_err(|e| StoreError::from_storage(e.into(), &self.path))?;

        Ok(StoreStats {
            path: self.path.clone(),
            dimension: self.dimension.get(),
            mode: self.mode,
            rows: rows.len(),
            live_rows,
            distinct_keys: distinct.len(),
            file_size,
        })
    }

    /// Number of committed rows, including superseded ones.
    pub fn len(&self) -> usize {
        self.segment.read().row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn mode(&self) -> UpsertMode {
        self.mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    fn validate_batch(&self, items: &[StoredItem]) -> Result<(), VectorError> {
        if items.is_empty() {
            return Err(VectorError::EmptyBatch);
        }
        for item in items {
            validate_key(&item.key)?;
            self.dimension.validate_vector(item.vector.as_slice())?;
        }
        Ok(())
    }

    fn storage_result<T>(&self, joined: Result<Result<T, StorageError>, JoinError>) -> StoreResult<T> {
        match joined {
            Ok(result) => result.map_err(|e| StoreError::from_storage(e, &self.path)),
            Err(e) => Err(StoreError::Unavailable {
                reason: format!("storage task failed: {e}"),
            }),
        }
    }
}

/// Scores every live row of the segment and keeps the best `top_k`.
fn rank_segment(
    segment: &SegmentFile,
    query: &Embedding,
    top_k: usize,
    mode: UpsertMode,
) -> Result<Vec<SimilarityMatch>, StorageError> {
    let rows: Vec<RowRef<'_>> = segment.rows().collect::<Result<_, _>>()?;
    let live = live_rows(rows, mode);

    let query_slice = query.as_slice();
    let query_norm = query.norm();
    let candidates: Vec<Candidate> = live
        .par_iter()
        .map(|row| Candidate {
            seq: row.seq,
            key: row.key.to_string(),
            score: row.cosine(query_slice, query_norm),
        })
        .collect();

    Ok(rank_top_k(candidates, top_k))
}

/// Drops rows hidden by a later write to the same key in replace mode.
fn live_rows(rows: Vec<RowRef<'_>>, mode: UpsertMode) -> Vec<RowRef<'_>> {
    match mode {
        UpsertMode::Append => rows,
        UpsertMode::Replace => {
            let mut latest: HashMap<&str, u64> = HashMap::with_capacity(rows.len());
            for row in &rows {
                latest.insert(row.key, row.seq);
            }
            rows.into_iter()
                .filter(|row| latest.get(row.key) == Some(&row.seq))
                .collect()
        }
    }
}
