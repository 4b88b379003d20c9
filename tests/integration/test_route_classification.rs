//! Classification against hand-built and encoder-built corpora.

use anyhow::Result;
use vecroute::{
    ClassifierConfig, Route, RouteCatalog, RouteClassifier, RouteCorpus, RouteOutcome,
};
use vecroute::routing::CatalogRoute;

use crate::common::{KeywordEncoder, embedding};

fn config(threshold: f32) -> ClassifierConfig {
    ClassifierConfig {
        threshold,
        fallback_route: "off_topic".to_string(),
    }
}

fn transfer_balance_corpus() -> RouteCorpus {
    RouteCorpus::new(vec![
        Route::new("Transfer", vec![embedding(&[1.0, 0.0, 0.0])]),
        Route::new("Balance", vec![embedding(&[0.0, 1.0, 0.0])]),
    ])
    .unwrap()
}

#[test]
fn test_best_route_above_threshold_is_matched() -> Result<()> {
    let classifier = RouteClassifier::new(transfer_balance_corpus(), config(0.75))?;
    // Cosine 0.9 to the Transfer exemplar and 0.3 to the Balance exemplar.
    let query = embedding(&[0.9, 0.3, 0.1_f32.sqrt()]);

    let result = classifier.classify(&query)?;
    assert_eq!(result.outcome, RouteOutcome::Matched("Transfer".to_string()));
    assert!((result.score - 0.9).abs() < 1e-4);
    Ok(())
}

#[test]
fn test_best_route_below_threshold_falls_back() -> Result<()> {
    let classifier = RouteClassifier::new(transfer_balance_corpus(), config(0.95))?;
    let query = embedding(&[0.9, 0.3, 0.1_f32.sqrt()]);

    let result = classifier.classify(&query)?;
    assert_eq!(result.outcome, RouteOutcome::Fallback("off_topic".to_string()));
    // The fallback still reports the best score that was found.
    assert!((result.score - 0.9).abs() < 1e-4);
    Ok(())
}

#[test]
fn test_score_equal_to_threshold_is_accepted() -> Result<()> {
    let classifier = RouteClassifier::new(transfer_balance_corpus(), config(1.0))?;
    let result = classifier.classify(&embedding(&[0.0, 2.0, 0.0]))?;
    assert_eq!(result.outcome, RouteOutcome::Matched("Balance".to_string()));
    Ok(())
}

#[test]
fn test_route_score_is_best_exemplar() -> Result<()> {
    let corpus = RouteCorpus::new(vec![
        Route::new(
            "Swap",
            vec![embedding(&[0.0, 1.0]), embedding(&[1.0, 0.0])],
        ),
        Route::new("Stake", vec![embedding(&[0.7, 0.7])]),
    ])?;
    let classifier = RouteClassifier::new(corpus, config(0.5))?;

    let result = classifier.classify(&embedding(&[1.0, 0.0]))?;
    assert_eq!(result.outcome.name(), "Swap");
    assert!((result.score - 1.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_catalog_encoded_corpus_routes_utterances() -> Result<()> {
    let catalog = RouteCatalog::new(vec![
        CatalogRoute::new("DeFiTransfer", &["send 5 ETH to vitalik.eth", "send my USDC"]),
        CatalogRoute::new("DeFiBalance", &["what is my balance", "show wallet balance"]),
    ]);
    let encoder = KeywordEncoder::new(&["send", "balance"]);
    let corpus = RouteCorpus::encode(&catalog, &encoder)?;
    assert_eq!(corpus.exemplar_count(), 4);

    let classifier = RouteClassifier::new(corpus, config(0.82))?;
    let query = &vecroute::Encoder::encode_batch(&encoder, &["please send 1 SOL"])?[0];
    assert_eq!(
        classifier.classify(query)?.outcome,
        RouteOutcome::Matched("DeFiTransfer".to_string())
    );

    let unrelated = &vecroute::Encoder::encode_batch(&encoder, &["tell me a joke"])?[0];
    assert!(classifier.classify(unrelated)?.outcome.is_fallback());
    Ok(())
}

#[test]
fn test_corpus_file_round_trip_preserves_decisions() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("corpus.json");
    transfer_balance_corpus().save(&path)?;

    let classifier = RouteClassifier::new(RouteCorpus::from_file(&path)?, config(0.75))?;
    let result = classifier.classify(&embedding(&[0.9, 0.3, 0.1_f32.sqrt()]))?;
    assert_eq!(result.outcome.name(), "Transfer");
    Ok(())
}
