//! Intent → pipeline selection.
//!
//! The pipelines themselves (prompting, generation, output parsing) live
//! outside this crate. The dispatcher only names which one should run and
//! packages what the classifier and store found for it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::routing::classifier::ClassificationResult;
use crate::vector::SimilarityMatch;

/// Name of an external pipeline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineKey(String);

impl PipelineKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PipelineKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Dispatch table configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Pipeline for the fallback outcome and any unmapped intent.
    #[serde(default = "default_pipeline")]
    pub default_pipeline: PipelineKey,

    /// Pipelines that receive store matches along with the query.
    #[serde(default = "default_retrieval_pipelines")]
    pub retrieval_pipelines: BTreeSet<PipelineKey>,

    /// Intent name → pipeline.
    #[serde(default = "default_table")]
    pub table: BTreeMap<String, PipelineKey>,
}

fn default_pipeline() -> PipelineKey {
    PipelineKey::new("off_topic")
}

fn default_table() -> BTreeMap<String, PipelineKey> {
    [
        ("DefiStakeBorrowLend", "defi_stake_borrow_lend_extract"),
        ("DeFiBalance", "defi_balance_extract"),
        ("DeFiSwap", "defi_swap_extract"),
        ("DefiSymmetryBaskets", "defi_symmetry_baskets_extract"),
        ("DeFiTransfer", "defi_transfer_extract"),
        ("CoinProjectSearch", "coin_project_search_extractor"),
        ("MediaAction", "media_action_extract"),
        ("CoinChartSimilarity", "coin_chart_similarity_extract"),
        ("DeFiTalker", "defi_talker"),
        ("MediaTalker", "media_query_extract"),
        ("CoinTA", "coin_extractor"),
        ("MediaInfo", "media_info"),
        ("CoinSearch", "coin_chart_similarity_extract"),
    ]
    .into_iter()
    .map(|(intent, pipeline)| (intent.to_string(), PipelineKey::new(pipeline)))
    .collect()
}

fn default_retrieval_pipelines() -> BTreeSet<PipelineKey> {
    BTreeSet::from([PipelineKey::new("coin_chart_similarity_extract")])
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_pipeline: default_pipeline(),
            retrieval_pipelines: default_retrieval_pipelines(),
            table: default_table(),
        }
    }
}

/// Everything the external generation layer needs to run a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchRequest {
    pub pipeline: PipelineKey,
    /// Intent name the classifier reported (the fallback name on fallback).
    pub intent: String,
    pub fallback: bool,
    pub score: f32,
    pub query: String,
    /// Similar stored items; empty unless the pipeline is a retrieval pipeline.
    pub matches: Vec<SimilarityMatch>,
}

/// Static intent → pipeline lookup. Never yields "no pipeline".
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    /// Pipeline for a classification outcome.
    pub fn select(&self, result: &ClassificationResult) -> &PipelineKey {
        if result.outcome.is_fallback() {
            return &self.config.default_pipeline;
        }

        let intent = result.outcome.name();
        match self.config.table.get(intent) {
            Some(pipeline) => pipeline,
            None => {
                warn!(
                    intent,
                    default = %self.config.default_pipeline,
                    "intent has no pipeline mapping; using default"
                );
                &self.config.default_pipeline
            }
        }
    }

    /// Whether `pipeline` expects similar items from the store.
    pub fn wants_matches(&self, pipeline: &PipelineKey) -> bool {
        self.config.retrieval_pipelines.contains(pipeline)
    }

    /// Builds the request for the external pipeline layer.
    pub fn dispatch(
        &self,
        result: &ClassificationResult,
        query: impl Into<String>,
        matches: Vec<SimilarityMatch>,
    ) -> DispatchRequest {
        DispatchRequest {
            pipeline: self.select(result).clone(),
            intent: result.outcome.name().to_string(),
            fallback: result.outcome.is_fallback(),
            score: result.score,
            query: query.into(),
            matches,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}
