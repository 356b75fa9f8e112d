//! The read-only local copy of the document that is used when the remote store is unreachable.

use crate::error::Res;
use crate::utils;
use anyhow::Context;
use serde_json::Value;
use std::path::Path;

/// Reads the JSON document at `path`. There is no way to write it back.
pub(crate) async fn read_local(path: &Path) -> Res<Value> {
    let content = utils::read(path)
        .await
        .context("Unable to read the local fallback document")?;
    serde_json::from_str(&content)
        .with_context(|| format!("The local fallback at {} is not valid JSON", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_local() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("payments.json");
        utils::write(&path, r#"{"payments": []}"#).await.unwrap();
        let value = read_local(&path).await.unwrap();
        assert_eq!(value["payments"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_read_local_missing_or_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("payments.json");
        assert!(read_local(&path).await.is_err());
        utils::write(&path, "{").await.unwrap();
        assert!(read_local(&path).await.is_err());
    }
}
