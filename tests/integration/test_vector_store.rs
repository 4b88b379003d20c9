//! Store behavior across the public API: ranking, upsert modes and
//! persistence across reopen.

use anyhow::Result;
use tempfile::TempDir;
use vecroute::{StoreError, StoredItem, UpsertMode, VectorError};

use crate::common::{embedding, open_store};

fn coins() -> Vec<StoredItem> {
    vec![
        StoredItem::new("BTC", embedding(&[1.0, 0.2, 0.0])),
        StoredItem::new("ETH", embedding(&[0.1, 1.0, 0.1])),
        StoredItem::new("SOL", embedding(&[0.0, 0.3, 1.0])),
    ]
}

#[tokio::test]
async fn test_query_returns_exact_match_first() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(dir.path(), 3, UpsertMode::Append);
    store.upsert(coins()).await?;

    let matches = store.query(&embedding(&[0.1, 1.0, 0.1]), 2).await?;

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].key, "ETH");
    assert!((matches[0].score - 1.0).abs() < 1e-5);
    // SOL shares more of the ETH direction than BTC does.
    assert_eq!(matches[1].key, "SOL");
    assert!(matches[1].score < matches[0].score);
    Ok(())
}

#[tokio::test]
async fn test_top_k_cardinality() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(dir.path(), 3, UpsertMode::Append);
    let query = embedding(&[1.0, 1.0, 1.0]);

    assert!(store.query(&query, 3).await?.is_empty());

    store.upsert(coins()).await?;
    assert_eq!(store.query(&query, 1).await?.len(), 1);
    assert_eq!(store.query(&query, 3).await?.len(), 3);
    assert_eq!(store.query(&query, 50).await?.len(), 3);

    let scores: Vec<f32> = store
        .query(&query, 3)
        .await?
        .iter()
        .map(|m| m.score)
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    Ok(())
}

#[tokio::test]
async fn test_identical_scores_keep_insertion_order() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(dir.path(), 2, UpsertMode::Append);
    for key in ["first", "second", "third"] {
        store
            .upsert(vec![StoredItem::new(key, embedding(&[0.6, 0.8]))])
            .await?;
    }

    let keys: Vec<String> = store
        .query(&embedding(&[3.0, 4.0]), 3)
        .await?
        .into_iter()
        .map(|m| m.key)
        .collect();
    assert_eq!(keys, ["first", "second", "third"]);
    Ok(())
}

#[tokio::test]
async fn test_append_keeps_history_replace_keeps_latest() -> Result<()> {
    let query = embedding(&[1.0, 0.0]);
    let versions = || {
        vec![
            StoredItem::new("BTC", embedding(&[1.0, 0.0])),
            StoredItem::new("BTC", embedding(&[0.0, 1.0])),
        ]
    };

    let append_dir = TempDir::new()?;
    let append = open_store(append_dir.path(), 2, UpsertMode::Append);
    append.upsert(versions()).await?;
    let matches = append.query(&query, 10).await?;
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.key == "BTC"));

    let replace_dir = TempDir::new()?;
    let replace = open_store(replace_dir.path(), 2, UpsertMode::Replace);
    replace.upsert(versions()).await?;
    let matches = replace.query(&query, 10).await?;
    assert_eq!(matches.len(), 1);
    assert!(matches[0].score.abs() < 1e-6, "latest vector is orthogonal");
    Ok(())
}

#[tokio::test]
async fn test_rows_survive_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    {
        let store = open_store(dir.path(), 3, UpsertMode::Append);
        store.upsert(coins()).await?;
    }

    let reopened = open_store(dir.path(), 3, UpsertMode::Append);
    assert_eq!(reopened.len(), 3);
    let matches = reopened.query(&embedding(&[1.0, 0.2, 0.0]), 1).await?;
    assert_eq!(matches[0].key, "BTC");

    reopened
        .upsert(vec![StoredItem::new("DOGE", embedding(&[0.5, 0.5, 0.5]))])
        .await?;
    drop(reopened);
    assert_eq!(open_store(dir.path(), 3, UpsertMode::Append).len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_invalid_calls_are_input_errors() -> Result<()> {
    let dir = TempDir::new()?;
    let store = open_store(dir.path(), 3, UpsertMode::Append);
    store.upsert(coins()).await?;

    let short = store.query(&embedding(&[1.0, 0.0]), 1).await;
    assert!(matches!(
        short,
        Err(StoreError::Input(VectorError::DimensionMismatch { .. }))
    ));

    let zero = store.query(&embedding(&[0.0, 0.0, 0.0]), 1).await;
    assert!(matches!(
        zero,
        Err(StoreError::Input(VectorError::ZeroMagnitude))
    ));

    let bad_batch = vec![
        StoredItem::new("ok", embedding(&[1.0, 0.0, 0.0])),
        StoredItem::new("short", embedding(&[1.0])),
    ];
    assert!(store.upsert(bad_batch).await.is_err());
    assert_eq!(store.len(), 3, "a rejected batch writes nothing");
    Ok(())
}

#[test]
fn test_reopen_with_other_dimension_is_rejected() {
    let dir = TempDir::new().unwrap();
    drop(open_store(dir.path(), 3, UpsertMode::Append));

    let options = vecroute::StoreOptions::new(vecroute::Dimension::new(4).unwrap());
    let result = vecroute::VectorStore::open(dir.path(), options);
    assert!(matches!(
        result,
        Err(StoreError::DimensionConflict {
            stored: 3,
            configured: 4,
            ..
        })
    ));
}
