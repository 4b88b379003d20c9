//! Settings layering: defaults, then the settings file.

use std::fs;

use tempfile::TempDir;
use vecroute::{Settings, UpsertMode};

#[test]
fn test_file_overrides_defaults_and_keeps_the_rest() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(
        &path,
        r#"
[store]
dimension = 3
upsert_mode = "replace"

[classifier]
threshold = 0.75

[dispatch.table]
News = "news_digest"
"#,
    )
    .unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.store.dimension, 3);
    assert_eq!(settings.store.upsert_mode, UpsertMode::Replace);
    assert_eq!(settings.store.default_top_k, 5);
    assert_eq!(settings.classifier.policy.threshold, 0.75);
    assert_eq!(settings.classifier.policy.fallback_route, "off_topic");

    let table = &settings.dispatch.table;
    assert_eq!(table["News"].as_str(), "news_digest");
    assert_eq!(table["DeFiTransfer"].as_str(), "defi_transfer_extract");
}

#[test]
fn test_init_writes_loadable_defaults() {
    let dir = TempDir::new().unwrap();
    let path = Settings::init_config_file_in(dir.path(), false).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    let defaults = Settings::default();
    assert_eq!(loaded.store.dimension, defaults.store.dimension);
    assert_eq!(loaded.classifier.policy.threshold, defaults.classifier.policy.threshold);
    assert_eq!(loaded.dispatch, defaults.dispatch);

    assert!(Settings::init_config_file_in(dir.path(), false).is_err());
    assert!(Settings::init_config_file_in(dir.path(), true).is_ok());
}
