//! Route corpus: intents with pre-encoded exemplar embeddings.
//!
//! Built once at startup and shared read-only afterwards. Construction
//! validates everything the classifier relies on, so a bad corpus fails
//! loudly instead of degrading into silent fallbacks.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::error::{CorpusError, CorpusResult};
use crate::routing::catalog::RouteCatalog;
use crate::vector::{Dimension, Embedding};

/// Failure reported by an external encoder.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct EncoderError(pub String);

/// Text → vector capability consumed by the corpus builder.
///
/// Implementations wrap whatever model produces embeddings; this crate
/// never computes embeddings itself.
pub trait Encoder: Send + Sync {
    /// Encode multiple texts, returning one embedding per input in order.
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EncoderError>;

    /// Dimension of every embedding this encoder produces.
    #[must_use]
    fn dimension(&self) -> Dimension;
}

/// A named intent with its exemplar embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    #[serde(default)]
    pub exemplars: Vec<Embedding>,
}

impl Route {
    pub fn new(name: impl Into<String>, exemplars: Vec<Embedding>) -> Self {
        Self {
            name: name.into(),
            exemplars,
        }
    }
}

/// On-disk layout of a pre-encoded corpus.
#[derive(Debug, Serialize, Deserialize)]
struct CorpusFile {
    routes: Vec<Route>,
}

/// Validated, immutable list of routes in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCorpus {
    routes: Vec<Route>,
    dimension: Option<Dimension>,
}

impl RouteCorpus {
    /// Builds a corpus, checking names and exemplar dimensions.
    ///
    /// Individual routes without exemplars are allowed; they can never be
    /// selected. A corpus with no exemplars at all is rejected.
    pub fn new(routes: Vec<Route>) -> CorpusResult<Self> {
        if routes.is_empty() {
            return Err(CorpusError::Empty);
        }

        let mut seen = HashSet::with_capacity(routes.len());
        let mut dimension: Option<Dimension> = None;
        for (position, route) in routes.iter().enumerate() {
            if route.name.trim().is_empty() {
                return Err(CorpusError::EmptyRouteName { position });
            }
            if !seen.insert(route.name.as_str()) {
                return Err(CorpusError::DuplicateRoute {
                    name: route.name.clone(),
                });
            }
            for (exemplar, embedding) in route.exemplars.iter().enumerate() {
                let expected = *dimension.get_or_insert(embedding.dimension());
                if embedding.dimension() != expected {
                    return Err(CorpusError::MixedDimensions {
                        route: route.name.clone(),
                        exemplar,
                        expected: expected.get(),
                        actual: embedding.len(),
                    });
                }
            }
        }

        match dimension {
            Some(dimension) => Ok(Self {
                routes,
                dimension: Some(dimension),
            }),
            None => Err(CorpusError::NoExemplars),
        }
    }

    /// Corpus with no routes. Only reachable through
    /// `RouteClassifier::fallback_only`.
    pub(crate) fn empty() -> Self {
        Self {
            routes: Vec::new(),
            dimension: None,
        }
    }

    /// Loads a pre-encoded corpus from JSON:
    /// `{"routes":[{"name":"...","exemplars":[[0.1, ...], ...]}]}`.
    pub fn from_file(path: impl AsRef<Path>) -> CorpusResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CorpusError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CorpusFile =
            serde_json::from_str(&content).map_err(|source| CorpusError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let corpus = Self::new(file.routes)?;
        info!(
            path = %path.display(),
            routes = corpus.len(),
            exemplars = corpus.exemplar_count(),
            "loaded route corpus"
        );
        Ok(corpus)
    }

    /// Writes the corpus in the format read by `from_file`.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = CorpusFile {
            routes: self.routes.clone(),
        };
        let json = serde_json::to_string(&file).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Encodes every utterance of `catalog` in one batch.
    pub fn encode(catalog: &RouteCatalog, encoder: &dyn Encoder) -> CorpusResult<Self> {
        let texts: Vec<&str> = catalog
            .routes
            .iter()
            .flat_map(|r| r.utterances.iter().map(String::as_str))
            .collect();

        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            encoder
                .encode_batch(&texts)
                .map_err(|e| CorpusError::Encoder { reason: e.0 })?
        };
        if embeddings.len() != texts.len() {
            return Err(CorpusError::EncoderCount {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }

        let mut routes = Vec::with_capacity(catalog.routes.len());
        let mut rest = embeddings.into_iter();
        for entry in &catalog.routes {
            let exemplars: Vec<Embedding> = rest.by_ref().take(entry.utterances.len()).collect();
            routes.push(Route::new(entry.name.clone(), exemplars));
        }

        let corpus = Self::new(routes)?;
        if let Some(dimension) = corpus.dimension {
            if dimension != encoder.dimension() {
                return Err(CorpusError::MixedDimensions {
                    route: corpus.routes[0].name.clone(),
                    exemplar: 0,
                    expected: encoder.dimension().get(),
                    actual: dimension.get(),
                });
            }
        }
        Ok(corpus)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Dimension shared by every exemplar, if any exemplar exists.
    pub fn dimension(&self) -> Option<Dimension> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn exemplar_count(&self) -> usize {
        self.routes.iter().map(|r| r.exemplars.len()).sum()
    }
}

/// Deterministic keyword encoder for tests.
#[cfg(test)]
pub struct MockEncoder {
    dimension: Dimension,
}

#[cfg(test)]
impl MockEncoder {
    /// Keywords mapped to axes; texts without a keyword land on the last axis.
    const KEYWORDS: [&'static str; 4] = ["stake", "balance", "send", "news"];

    pub fn new() -> Self {
        Self {
            dimension: Dimension::new(Self::KEYWORDS.len() + 1).unwrap(),
        }
    }
}

#[cfg(test)]
impl Encoder for MockEncoder {
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EncoderError> {
        texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut values = vec![0.0; self.dimension.get()];
                match Self::KEYWORDS.iter().position(|k| lower.contains(k)) {
                    Some(axis) => values[axis] = 1.0,
                    None => values[Self::KEYWORDS.len()] = 1.0,
                }
                Embedding::new(values).map_err(|e| EncoderError(e.to_string()))
            })
            .collect()
    }

    fn dimension(&self) -> Dimension {
        self.dimension
    }
}
