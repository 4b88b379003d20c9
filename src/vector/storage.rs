//! Memory-mapped segment file holding keyed embedding rows.
//!
//! # Storage Format
//!
//! - Header (16 bytes): magic, format version, dimension, committed row count
//! - Rows: key length (u32), UTF-8 key bytes, `dimension` f32 values
//!
//! All integers and floats are little-endian. Rows are only ever appended.
//! The row count in the header is the commit marker: a batch becomes visible
//! once its rows are on disk *and* the header count covers them. Bytes past
//! the last committed row are an interrupted write and get truncated before
//! the next append.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::vector::similarity::finish_cosine;
use crate::vector::types::{Dimension, StoredItem, VectorError};

/// Current storage format version.
const FORMAT_VERSION: u32 = 1;

/// Size of the storage header in bytes.
const HEADER_SIZE: usize = 16;

/// Byte offset of the committed row count inside the header.
const ROW_COUNT_OFFSET: u64 = 12;

/// Magic bytes to identify segment files.
const MAGIC_BYTES: &[u8; 4] = b"VRSG";

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Number of bytes for the key length prefix.
const BYTES_PER_LEN: usize = 4;

/// Longest key accepted, in bytes.
pub const MAX_KEY_BYTES: usize = 1024;

/// File name of the segment inside the store directory.
pub const SEGMENT_FILE_NAME: &str = "vectors.seg";

/// Errors specific to segment file operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid segment format: {0}")]
    InvalidFormat(String),

    #[error(
        "Segment stores {stored}-dimensional vectors but {configured} was configured\nSuggestion: Point the store at a new directory when switching embedding models"
    )]
    DimensionConflict { stored: usize, configured: usize },

    #[error(
        "Invalid segment version: expected {expected}, got {actual}\nSuggestion: Rebuild the store with this version"
    )]
    VersionMismatch { expected: u32, actual: u32 },

    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),

    #[error("Write cancelled before commit")]
    Cancelled,
}

/// A committed row, borrowed from the memory map.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    /// Zero-based insertion position.
    pub seq: u64,
    pub key: &'a str,
    vector_bytes: &'a [u8],
    end: usize,
}

impl RowRef<'_> {
    /// Decodes the vector into owned components.
    #[must_use]
    pub fn vector(&self) -> Vec<f32> {
        self.vector_bytes
            .chunks_exact(BYTES_PER_F32)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    /// Cosine similarity against a query whose norm is already known.
    ///
    /// Decodes in place without allocating. Rows with zero magnitude score 0.0.
    #[must_use]
    pub fn cosine(&self, query: &[f32], query_norm: f64) -> f32 {
        let mut dot = 0.0f64;
        let mut norm_sq = 0.0f64;
        for (&q, b) in query
            .iter()
            .zip(self.vector_bytes.chunks_exact(BYTES_PER_F32))
        {
            let v = f64::from(f32::from_le_bytes([b[0], b[1], b[2], b[3]]));
            dot += f64::from(q) * v;
            norm_sq += v * v;
        }
        finish_cosine(dot, norm_sq.sqrt(), query_norm)
    }
}

/// Append-only, memory-mapped segment file.
///
/// Not synchronized on its own; `VectorStore` wraps it in a lock.
#[derive(Debug)]
pub struct SegmentFile {
    /// Path to the segment file.
    path: PathBuf,

    /// Map of the file, refreshed after every commit.
    mmap: Mmap,

    /// Vector dimension (every row has exactly this many components).
    dimension: Dimension,

    /// Number of committed rows.
    row_count: usize,

    /// Byte offset just past the last committed row.
    committed_len: u64,

    /// Whether commits call `sync_data` before returning.
    sync_writes: bool,
}

impl SegmentFile {
    /// Opens the segment in `dir`, creating it if it doesn't exist.
    ///
    /// An existing segment must have been written with `dimension`.
    pub fn open_or_create(
        dir: impl AsRef<Path>,
        dimension: Dimension,
        sync_writes: bool,
    ) -> Result<Self, StorageError> {
        let path = Self::segment_path(dir.as_ref());

        if path.exists() {
            let segment = Self::open(dir, sync_writes)?;
            if segment.dimension != dimension {
                return Err(StorageError::DimensionConflict {
                    stored: segment.dimension.get(),
                    configured: dimension.get(),
                });
            }
            return Ok(segment);
        }

        std::fs::create_dir_all(dir.as_ref())?;
        let mut file = File::create(&path)?;
        write_header(&mut file, dimension)?;
        file.flush()?;
        if sync_writes {
            file.sync_all()?;
        }
        info!(path = %path.display(), dimension = dimension.get(), "created vector segment");

        let mmap = map_file(&path)?;
        Ok(Self {
            path,
            mmap,
            dimension,
            row_count: 0,
            committed_len: HEADER_SIZE as u64,
            sync_writes,
        })
    }

    /// Opens an existing segment from disk.
    ///
    /// Returns an error if the file doesn't exist or has invalid format.
    pub fn open(dir: impl AsRef<Path>, sync_writes: bool) -> Result<Self, StorageError> {
        let path = Self::segment_path(dir.as_ref());
        if !path.exists() {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Vector segment not found: {}", path.display()),
            )));
        }

        let mmap = map_file(&path)?;
        let (version, dimension, row_count) = read_header(&mmap)?;
        if version != FORMAT_VERSION {
            return Err(StorageError::VersionMismatch {
                expected: FORMAT_VERSION,
                actual: version,
            });
        }

        let mut segment = Self {
            path,
            mmap,
            dimension,
            row_count,
            committed_len: HEADER_SIZE as u64,
            sync_writes,
        };

        // Walk the committed rows once to validate them and find the end offset.
        let mut end = HEADER_SIZE;
        for row in segment.rows() {
            end = row?.end;
        }
        segment.committed_len = end as u64;

        let tail = segment.mmap.len() as u64 - segment.committed_len;
        if tail > 0 {
            warn!(
                path = %segment.path.display(),
                bytes = tail,
                "segment has an uncommitted tail from an interrupted write; it will be discarded"
            );
        }
        info!(
            path = %segment.path.display(),
            rows = segment.row_count,
            dimension = dimension.get(),
            "opened vector segment"
        );
        Ok(segment)
    }

    /// Appends and commits a batch of rows.
    ///
    /// Every item is validated before anything touches the file. If `cancel`
    /// fires before the commit marker is written, the appended bytes are
    /// truncated and `StorageError::Cancelled` is returned.
    pub fn append_batch(
        &mut self,
        items: &[StoredItem],
        cancel: Option<&CancellationToken>,
    ) -> Result<(), StorageError> {
        if items.is_empty() {
            return Err(VectorError::EmptyBatch.into());
        }
        self.validate_items(items)?;

        let new_count = self.row_count + items.len();
        let header_count = u32::try_from(new_count).map_err(|_| {
            StorageError::InvalidFormat(format!("row count {new_count} exceeds segment capacity"))
        })?;

        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        // Drop any uncommitted tail left by an interrupted write.
        file.set_len(self.committed_len)?;
        file.seek(SeekFrom::Start(self.committed_len))?;

        let mut written = 0u64;
        {
            let mut writer = BufWriter::new(&mut file);
            for item in items {
                let key = item.key.as_bytes();
                writer.write_all(&(key.len() as u32).to_le_bytes())?;
                writer.write_all(key)?;
                for &value in item.vector.as_slice() {
                    writer.write_all(&value.to_le_bytes())?;
                }
                written += (BYTES_PER_LEN + key.len() + self.dimension.get() * BYTES_PER_F32) as u64;
            }
            writer.flush()?;
        }
        if self.sync_writes {
            file.sync_data()?;
        }

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            file.set_len(self.committed_len)?;
            warn!(rows = items.len(), "write cancelled before commit; batch discarded");
            return Err(StorageError::Cancelled);
        }

        file.seek(SeekFrom::Start(ROW_COUNT_OFFSET))?;
        file.write_all(&header_count.to_le_bytes())?;
        file.flush()?;
        if self.sync_writes {
            file.sync_data()?;
        }

        self.row_count = new_count;
        self.committed_len += written;
        self.mmap = map_file(&self.path)?;

        debug!(rows = items.len(), total = self.row_count, "committed batch");
        Ok(())
    }

    fn validate_items(&self, items: &[StoredItem]) -> Result<(), VectorError> {
        for item in items {
            validate_key(&item.key)?;
            self.dimension.validate_vector(item.vector.as_slice())?;
        }
        Ok(())
    }

    /// Iterates committed rows in insertion order.
    pub fn rows(&self) -> RowIter<'_> {
        RowIter {
            data: &self.mmap,
            offset: HEADER_SIZE,
            seq: 0,
            remaining: self.row_count,
            dimension: self.dimension,
        }
    }

    /// Reads all committed rows into owned pairs.
    pub fn read_all(&self) -> Result<Vec<(String, Vec<f32>)>, StorageError> {
        self.rows()
            .map(|row| row.map(|r| (r.key.to_string(), r.vector())))
            .collect()
    }

    /// Returns the number of committed rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the vector dimension.
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Returns the path of the segment file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the size of the segment file in bytes.
    pub fn file_size(&self) -> Result<u64, io::Error> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    fn segment_path(dir: &Path) -> PathBuf {
        dir.join(SEGMENT_FILE_NAME)
    }
}

/// Iterator over committed rows of a segment.
pub struct RowIter<'a> {
    data: &'a [u8],
    offset: usize,
    seq: u64,
    remaining: usize,
    dimension: Dimension,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = Result<RowRef<'a>, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let result =
            decode_row(self.data, self.offset, self.dimension).map(|(key, vector_bytes, next)| {
                let row = RowRef {
                    seq: self.seq,
                    key,
                    vector_bytes,
                    end: next,
                };
                self.offset = next;
                self.seq += 1;
                row
            });
        if result.is_err() {
            // Stop after the first corrupt row; later offsets are meaningless.
            self.remaining = 0;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Checks a key before it is written.
pub(crate) fn validate_key(key: &str) -> Result<(), VectorError> {
    if key.is_empty() {
        return Err(VectorError::InvalidKey {
            reason: "key cannot be empty",
        });
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(VectorError::InvalidKey {
            reason: "key exceeds 1024 bytes",
        });
    }
    Ok(())
}

fn decode_row(
    data: &[u8],
    offset: usize,
    dimension: Dimension,
) -> Result<(&str, &[u8], usize), StorageError> {
    let len_end = offset + BYTES_PER_LEN;
    if len_end > data.len() {
        return Err(truncated(offset));
    }
    let key_len = u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]) as usize;
    if key_len == 0 || key_len > MAX_KEY_BYTES {
        return Err(StorageError::InvalidFormat(format!(
            "row at byte {offset} has invalid key length {key_len}"
        )));
    }

    let key_end = len_end + key_len;
    let vector_end = key_end + dimension.get() * BYTES_PER_F32;
    if vector_end > data.len() {
        return Err(truncated(offset));
    }

    let key = std::str::from_utf8(&data[len_end..key_end]).map_err(|_| {
        StorageError::InvalidFormat(format!("row at byte {offset} has a non UTF-8 key"))
    })?;
    Ok((key, &data[key_end..vector_end], vector_end))
}

fn truncated(offset: usize) -> StorageError {
    StorageError::InvalidFormat(format!(
        "header row count runs past end of file at byte {offset}"
    ))
}

fn map_file(path: &Path) -> Result<Mmap, StorageError> {
    let file = File::open(path)?;
    // The file is only mutated through this process' write lock, and only
    // past the committed region or in the header after the data is durable.
    Ok(unsafe { MmapOptions::new().map(&file)? })
}

fn write_header(file: &mut File, dimension: Dimension) -> Result<(), io::Error> {
    file.write_all(MAGIC_BYTES)?;
    file.write_all(&FORMAT_VERSION.to_le_bytes())?;
    file.write_all(&(dimension.get() as u32).to_le_bytes())?;
    // Row count (initially 0)
    file.write_all(&0u32.to_le_bytes())?;
    Ok(())
}

fn read_header(data: &[u8]) -> Result<(u32, Dimension, usize), StorageError> {
    if data.len() < HEADER_SIZE {
        return Err(StorageError::InvalidFormat(
            "File too small to contain header".to_string(),
        ));
    }
    if &data[0..4] != MAGIC_BYTES {
        return Err(StorageError::InvalidFormat(
            "Invalid magic bytes".to_string(),
        ));
    }

    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let dim_value = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    let dimension = Dimension::new(dim_value as usize)?;
    let row_count = u32::from_le_bytes([data[12], data[13], data[14], data[15]]) as usize;

    Ok((version, dimension, row_count))
}
