//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use vecroute::routing::EncoderError;
use vecroute::{Dimension, Embedding, Encoder, StoreOptions, UpsertMode, VectorStore};

pub fn embedding(values: &[f32]) -> Embedding {
    Embedding::new(values.to_vec()).expect("fixture vectors are valid")
}

pub fn open_store(dir: &Path, dim: usize, mode: UpsertMode) -> VectorStore {
    let options = StoreOptions::new(Dimension::new(dim).unwrap())
        .with_mode(mode)
        .with_timeout(Duration::from_secs(5))
        .with_sync_writes(false);
    VectorStore::open(dir, options).expect("Failed to open store")
}

/// Encodes text onto one axis per keyword, plus a trailing axis for
/// everything else. Deterministic stand-in for a real embedding model.
pub struct KeywordEncoder {
    keywords: Vec<&'static str>,
}

impl KeywordEncoder {
    pub fn new(keywords: &[&'static str]) -> Self {
        Self {
            keywords: keywords.to_vec(),
        }
    }
}

impl Encoder for KeywordEncoder {
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EncoderError> {
        texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut values = vec![0.0; self.keywords.len() + 1];
                for (axis, keyword) in self.keywords.iter().enumerate() {
                    if lower.contains(keyword) {
                        values[axis] = 1.0;
                    }
                }
                if values.iter().all(|v| *v == 0.0) {
                    values[self.keywords.len()] = 1.0;
                }
                Embedding::new(values).map_err(|e| EncoderError(e.to_string()))
            })
            .collect()
    }

    fn dimension(&self) -> Dimension {
        Dimension::new(self.keywords.len() + 1).unwrap()
    }
}
