//! Parsing of vector and item arguments.

use std::path::Path;

use crate::io::error::CliError;
use crate::vector::{Embedding, StoredItem};

/// Parses a JSON array such as `[0.1, 0.2, 0.3]` into an embedding.
pub fn parse_vector(raw: &str) -> Result<Embedding, CliError> {
    serde_json::from_str(raw)
        .map_err(|e| CliError::InvalidArgument(format!("--vector must be a JSON array of numbers: {e}")))
}

/// Reads `[{"key": "...", "vector": [...]}, ...]` from a file.
pub fn read_items(path: &Path) -> Result<Vec<StoredItem>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::InvalidArgument(format!("Cannot read items file '{}': {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        CliError::InvalidArgument(format!("Invalid items file '{}': {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_vector() {
        let v = parse_vector("[1.0, 0.5]").unwrap();
        assert_eq!(v.as_slice(), &[1.0, 0.5]);
        assert!(matches!(parse_vector("[]"), Err(CliError::InvalidArgument(_))));
        assert!(matches!(parse_vector("1,2"), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_read_items() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, r#"[{"key":"BTC","vector":[1.0,0.0]},{"key":"ETH","vector":[0.0,1.0]}]"#)
            .unwrap();

        let items = read_items(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].key, "ETH");

        assert!(read_items(&dir.path().join("missing.json")).is_err());
    }
}
