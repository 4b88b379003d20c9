//! Threshold classifier over a route corpus.
//!
//! A route scores the best cosine similarity among its exemplars. The
//! highest-scoring route wins, earlier declarations win ties, and a winner
//! below the acceptance threshold is replaced by the configured fallback.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CorpusError, CorpusResult};
use crate::routing::corpus::{Route, RouteCorpus};
use crate::vector::{Embedding, VectorError, cosine_unchecked};

/// Acceptance policy for classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum score for a route to be accepted.
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Intent name reported when no route is accepted.
    #[serde(default = "default_fallback_route")]
    pub fallback_route: String,
}

fn default_threshold() -> f32 {
    0.82
}

fn default_fallback_route() -> String {
    "off_topic".to_string()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            fallback_route: default_fallback_route(),
        }
    }
}

/// Which intent a query was assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "route", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// A route met the threshold.
    Matched(String),
    /// Nothing met the threshold; carries the configured fallback name.
    Fallback(String),
}

impl RouteOutcome {
    /// Intent name, whether matched or fallback.
    pub fn name(&self) -> &str {
        match self {
            Self::Matched(name) | Self::Fallback(name) => name,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Classification decision plus the score that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub outcome: RouteOutcome,
    /// Best route score, or negative infinity when no route could be scored.
    pub score: f32,
}

/// Per-route score, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteScore {
    pub route: String,
    pub score: f32,
}

/// Stateless classifier. Cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    corpus: Arc<RouteCorpus>,
    config: ClassifierConfig,
}

impl RouteClassifier {
    /// Creates a classifier over a validated corpus.
    pub fn new(corpus: RouteCorpus, config: ClassifierConfig) -> CorpusResult<Self> {
        // `RouteCorpus::new` already refuses both; keep the guarantee if a
        // corpus ever arrives through another path.
        if corpus.is_empty() {
            return Err(CorpusError::Empty);
        }
        if corpus.exemplar_count() == 0 {
            return Err(CorpusError::NoExemplars);
        }
        Ok(Self {
            corpus: Arc::new(corpus),
            config,
        })
    }

    /// Creates a classifier that always returns the fallback.
    ///
    /// Use only when running without a corpus is intentional.
    pub fn fallback_only(config: ClassifierConfig) -> Self {
        warn!(
            fallback = %config.fallback_route,
            "route classifier has no corpus; every query will fall back"
        );
        Self {
            corpus: Arc::new(RouteCorpus::empty()),
            config,
        }
    }

    /// Assigns `query` to a route or to the fallback.
    ///
    /// Deterministic for identical inputs. A query whose dimension differs
    /// from the exemplars is an error, never a low score.
    pub fn classify(&self, query: &Embedding) -> Result<ClassificationResult, VectorError> {
        let mut best: Option<(&Route, f32)> = None;
        for (route, score) in self.route_scores(query)? {
            // Strictly greater keeps the earliest declared route on ties and
            // never selects a route without exemplars.
            if score > best.map_or(f32::NEG_INFINITY, |(_, s)| s) {
                best = Some((route, score));
            }
        }

        let result = match best {
            Some((route, score)) if score >= self.config.threshold => ClassificationResult {
                outcome: RouteOutcome::Matched(route.name.clone()),
                score,
            },
            Some((_, score)) => self.fallback(score),
            None => self.fallback(f32::NEG_INFINITY),
        };

        debug!(
            route = result.outcome.name(),
            score = result.score,
            fallback = result.outcome.is_fallback(),
            threshold = self.config.threshold,
            "classified query"
        );
        Ok(result)
    }

    /// Every route's score in declaration order.
    pub fn scores(&self, query: &Embedding) -> Result<Vec<RouteScore>, VectorError> {
        Ok(self
            .route_scores(query)?
            .map(|(route, score)| RouteScore {
                route: route.name.clone(),
                score,
            })
            .collect())
    }

    pub fn corpus(&self) -> &RouteCorpus {
        &self.corpus
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn route_scores<'a>(
        &'a self,
        query: &'a Embedding,
    ) -> Result<impl Iterator<Item = (&'a Route, f32)> + 'a, VectorError> {
        if let Some(dimension) = self.corpus.dimension() {
            dimension.validate_vector(query.as_slice())?;
        }

        Ok(self.corpus.routes().iter().map(move |route| {
            let score = route
                .exemplars
                .iter()
                .map(|exemplar| cosine_unchecked(query.as_slice(), exemplar.as_slice()))
                .fold(f32::NEG_INFINITY, f32::max);
            (route, score)
        }))
    }

    fn fallback(&self, score: f32) -> ClassificationResult {
        ClassificationResult {
            outcome: RouteOutcome::Fallback(self.config.fallback_route.clone()),
            score,
        }
    }
}
