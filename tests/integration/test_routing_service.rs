//! End-to-end routing: classify, select a pipeline, attach store matches.

use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;
use vecroute::{
    ClassifierConfig, DispatchRequest, Dispatcher, Route, RouteClassifier, RouteCorpus,
    RoutingService, StoredItem, UpsertMode,
};

use crate::common::{embedding, open_store};

async fn service(dir: &TempDir) -> Result<RoutingService> {
    let corpus = RouteCorpus::new(vec![
        Route::new("DeFiTransfer", vec![embedding(&[1.0, 0.0, 0.0])]),
        Route::new("CoinSearch", vec![embedding(&[0.0, 1.0, 0.0])]),
        Route::new("News", vec![embedding(&[0.0, 0.0, 1.0])]),
    ])?;
    let classifier = RouteClassifier::new(corpus, ClassifierConfig::default())?;

    let store = open_store(dir.path(), 3, UpsertMode::Append);
    store
        .upsert(vec![
            StoredItem::new("BTC", embedding(&[0.1, 1.0, 0.0])),
            StoredItem::new("ETH", embedding(&[0.0, 1.0, 0.3])),
        ])
        .await?;

    Ok(RoutingService::new(classifier, Dispatcher::default(), store, 5)?)
}

#[tokio::test]
async fn test_mapped_intent_without_retrieval() -> Result<()> {
    let dir = TempDir::new()?;
    let service = service(&dir).await?;

    let request = service
        .handle("send 2 ETH to bob", &embedding(&[1.0, 0.05, 0.0]))
        .await?;
    assert_eq!(request.intent, "DeFiTransfer");
    assert_eq!(request.pipeline.as_str(), "defi_transfer_extract");
    assert!(!request.fallback);
    assert_eq!(request.query, "send 2 ETH to bob");
    assert!(request.matches.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_retrieval_pipeline_gets_store_matches() -> Result<()> {
    let dir = TempDir::new()?;
    let service = service(&dir).await?;

    let request = service
        .handle("coins like bitcoin", &embedding(&[0.1, 1.0, 0.0]))
        .await?;
    assert_eq!(request.pipeline.as_str(), "coin_chart_similarity_extract");
    assert_eq!(request.matches.len(), 2);
    assert_eq!(request.matches[0].key, "BTC");
    Ok(())
}

#[tokio::test]
async fn test_unmapped_and_fallback_use_default_pipeline() -> Result<()> {
    let dir = TempDir::new()?;
    let service = service(&dir).await?;

    let news = service
        .handle("latest headlines", &embedding(&[0.0, 0.0, 1.0]))
        .await?;
    assert_eq!(news.intent, "News");
    assert_eq!(news.pipeline.as_str(), "off_topic");

    let vague = service
        .handle("hmm", &embedding(&[1.0, 1.0, 1.0]))
        .await?;
    assert!(vague.fallback);
    assert_eq!(vague.intent, "off_topic");
    assert_eq!(vague.pipeline.as_str(), "off_topic");
    Ok(())
}

#[tokio::test]
async fn test_concurrent_handles_share_one_store() -> Result<()> {
    let dir = TempDir::new()?;
    let service = Arc::new(service(&dir).await?);

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            let query = embedding(&[0.0, 1.0, i as f32 * 0.01]);
            service.handle("similar coins", &query).await
        }));
    }

    for handle in handles {
        let request: DispatchRequest = handle.await??;
        assert_eq!(request.matches.len(), 2);
    }
    Ok(())
}
