/*!
Classifies a table directory by probing for each format's sentinel layout.
*/

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog_model::TableFormat;
use crate::error::{DiscoveryError, Result};
use crate::object_store::ObjectStoreExt;

/// Probes an object-store prefix and classifies the table format present.
pub struct FormatDetector {
    store: Arc<dyn ObjectStoreExt>,
}

impl FormatDetector {
    /// Builds a detector over the given store.
    pub fn new(store: Arc<dyn ObjectStoreExt>) -> Self {
        FormatDetector { store }
    }

    /// Classifies the table at `prefix`, trying each format in fixed
    /// priority order (Iceberg, Delta, Hudi, Parquet) and returning the
    /// first match.
    pub async fn detect(&self, prefix: &str) -> Result<TableFormat> {
        let prefix = normalize_prefix(prefix);

        if self.is_iceberg(&prefix).await? {
            info!(prefix = %prefix, format = "iceberg", "format detected");
            return Ok(TableFormat::Iceberg);
        }
        if self.exists(&format!("{prefix}_delta_log/")).await? {
            info!(prefix = %prefix, format = "delta", "format detected");
            return Ok(TableFormat::Delta);
        }
        if self.exists(&format!("{prefix}.hoodie/")).await? {
            info!(prefix = %prefix, format = "hudi", "format detected");
            return Ok(TableFormat::Hudi);
        }
        if self.has_parquet_file(&prefix).await? {
            info!(prefix = %prefix, format = "parquet", "format detected");
            return Ok(TableFormat::Parquet);
        }

        debug!(prefix = %prefix, "no known sentinel matched");
        Err(DiscoveryError::Unrecognized { uri: prefix })
    }

    async fn exists(&self, prefix: &str) -> Result<bool> {
        Ok(!self.store.list(prefix, 1).await?.is_empty())
    }

    async fn is_iceberg(&self, prefix: &str) -> Result<bool> {
        let metadata_prefix = format!("{prefix}metadata/");
        let entries = self.store.list(&metadata_prefix, 1000).await?;
        Ok(entries.iter().any(|e| {
            e.key.ends_with(".metadata.json") || e.key.ends_with("version-hint.text")
        }))
    }

    async fn has_parquet_file(&self, prefix: &str) -> Result<bool> {
        let entries = self.store.list(prefix, 1000).await?;
        Ok(entries.iter().any(|e| {
            e.key
                .strip_prefix(prefix)
                .map_or(false, |rest| !rest.contains('/') && rest.ends_with(".parquet"))
        }))
    }
}

/// Ensures a prefix ends with exactly one trailing `/`.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use object_store::memory::InMemory;
    use object_store::path::Path;

    use super::*;

    fn store_with(paths: &[&str]) -> Arc<dyn ObjectStoreExt> {
        let mem = InMemory::new();
        let store: Arc<dyn object_store::ObjectStore> = Arc::new(mem);
        for p in paths {
            futures::executor::block_on(store.put(&Path::from(*p), "x".into())).unwrap();
        }
        store
    }

    #[tokio::test]
    async fn detects_iceberg_over_parquet_sibling() {
        let store = store_with(&[
            "wh/t/metadata/v1.metadata.json",
            "wh/t/data/part-0.parquet",
        ]);
        let detector = FormatDetector::new(store);
        assert_eq!(
            detector.detect("wh/t").await.unwrap(),
            TableFormat::Iceberg
        );
    }

    #[tokio::test]
    async fn detects_delta() {
        let store = store_with(&["wh/t/_delta_log/00000000000000000000.json"]);
        let detector = FormatDetector::new(store);
        assert_eq!(detector.detect("wh/t/").await.unwrap(), TableFormat::Delta);
    }

    #[tokio::test]
    async fn detects_hudi() {
        let store = store_with(&["wh/t/.hoodie/hoodie.properties"]);
        let detector = FormatDetector::new(store);
        assert_eq!(detector.detect("wh/t/").await.unwrap(), TableFormat::Hudi);
    }

    #[tokio::test]
    async fn detects_plain_parquet() {
        let store = store_with(&["wh/t/part-0000.parquet"]);
        let detector = FormatDetector::new(store);
        assert_eq!(
            detector.detect("wh/t/").await.unwrap(),
            TableFormat::Parquet
        );
    }

    #[tokio::test]
    async fn nested_parquet_without_direct_child_is_unrecognized() {
        let store = store_with(&["wh/t/country=US/part-0000.parquet"]);
        let detector = FormatDetector::new(store);
        assert!(matches!(
            detector.detect("wh/t/").await.unwrap_err(),
            DiscoveryError::Unrecognized { .. }
        ));
    }

    #[tokio::test]
    async fn unrecognized_when_nothing_matches() {
        let store = store_with(&["wh/t/readme.txt"]);
        let detector = FormatDetector::new(store);
        assert!(matches!(
            detector.detect("wh/t/").await.unwrap_err(),
            DiscoveryError::Unrecognized { .. }
        ));
    }
}
