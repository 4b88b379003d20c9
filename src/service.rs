//! End-to-end routing for one encoded utterance.
//!
//! `RoutingService` ties the classifier, dispatcher and store together:
//! classify, pick the pipeline, and fetch similar items when the pipeline
//! asks for them. All parts are explicitly constructed and passed in.

use std::time::Duration;

use tracing::{debug, info};

use crate::error::ServiceError;
use crate::routing::{DispatchRequest, Dispatcher, RouteClassifier};
use crate::vector::{Embedding, VectorStore};

/// Shared routing entry point. Clone per task.
#[derive(Debug, Clone)]
pub struct RoutingService {
    classifier: RouteClassifier,
    dispatcher: Dispatcher,
    store: VectorStore,
    top_k: usize,
    timeout: Duration,
}

impl RoutingService {
    /// Wires the parts together.
    ///
    /// Fails when the corpus and the store were built from encoders of
    /// different dimension, since every retrieval request would then fail.
    pub fn new(
        classifier: RouteClassifier,
        dispatcher: Dispatcher,
        store: VectorStore,
        top_k: usize,
    ) -> Result<Self, ServiceError> {
        if let Some(corpus) = classifier.corpus().dimension() {
            if corpus != store.dimension() {
                return Err(ServiceError::DimensionConflict {
                    corpus: corpus.get(),
                    store: store.dimension().get(),
                });
            }
        }

        let timeout = store.default_timeout();
        Ok(Self {
            classifier,
            dispatcher,
            store,
            top_k,
            timeout,
        })
    }

    /// Overrides the store query timeout used for retrieval pipelines.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Routes an utterance whose embedding the caller already computed.
    ///
    /// Store failures are returned as errors; they never become an empty
    /// match list.
    pub async fn handle(
        &self,
        utterance: &str,
        embedding: &Embedding,
    ) -> Result<DispatchRequest, ServiceError> {
        let result = self.classifier.classify(embedding)?;
        let pipeline = self.dispatcher.select(&result);

        let matches = if self.dispatcher.wants_matches(pipeline) {
            let matches = self
                .store
                .query_with_timeout(embedding, self.top_k, self.timeout)
                .await?;
            debug!(pipeline = %pipeline, matches = matches.len(), "attached store matches");
            matches
        } else {
            Vec::new()
        };

        let request = self.dispatcher.dispatch(&result, utterance, matches);
        info!(
            intent = %request.intent,
            pipeline = %request.pipeline,
            score = request.score,
            fallback = request.fallback,
            "routed utterance"
        );
        Ok(request)
    }

    pub fn classifier(&self) -> &RouteClassifier {
        &self.classifier
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }
}
