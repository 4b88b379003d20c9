//! Embedding-based intent routing.
//!
//! A `RouteCatalog` lists intents with example utterances. An external
//! `Encoder` turns it into a `RouteCorpus`, which the `RouteClassifier`
//! scores queries against. The `Dispatcher` maps the winning intent to the
//! pipeline that should handle it.

mod catalog;
mod classifier;
mod corpus;
mod dispatch;

pub use catalog::{CatalogRoute, RouteCatalog};
pub use classifier::{
    ClassificationResult, ClassifierConfig, RouteClassifier, RouteOutcome, RouteScore,
};
#[cfg(test)]
pub use corpus::MockEncoder;
pub use corpus::{Encoder, EncoderError, Route, RouteCorpus};
pub use dispatch::{DispatchConfig, DispatchRequest, Dispatcher, PipelineKey};
