/*!
[`DiscoveryEngine`]: wires detector, readers, normalizer and store into the
single `discover` pipeline, plus the read-only catalog accessors.
*/

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::catalog_model::{TableFormat, TableMetadata};
use crate::config::EngineConfig;
use crate::error::{Diagnostic, DiscoveryError, Result};
use crate::format::detector::FormatDetector;
use crate::normalizer;
use crate::object_store::ObjectStoreExt;
use crate::readers::delta::DeltaReader;
use crate::readers::hudi::HudiReader;
use crate::readers::iceberg::IcebergReader;
use crate::readers::parquet::ParquetReader;
use crate::readers::Raw;
use crate::store::MetadataStore;

/// Orchestrates the full discovery pipeline: detect format, read its native
/// metadata, normalize, and persist.
pub struct DiscoveryEngine {
    store: Arc<dyn ObjectStoreExt>,
    detector: FormatDetector,
    iceberg: IcebergReader,
    delta: DeltaReader,
    hudi: HudiReader,
    parquet: ParquetReader,
    catalog: MetadataStore,
}

impl DiscoveryEngine {
    /// Builds an engine over the given object store and catalog.
    pub fn new(store: Arc<dyn ObjectStoreExt>, catalog: MetadataStore) -> Self {
        DiscoveryEngine {
            detector: FormatDetector::new(store.clone()),
            iceberg: IcebergReader::new(store.clone()),
            delta: DeltaReader::new(store.clone()),
            hudi: HudiReader::new(store.clone()),
            parquet: ParquetReader::new(store.clone()),
            store,
            catalog,
        }
    }

    /// Builds an engine whose catalog backend is the one named by `config`.
    pub async fn from_config(store: Arc<dyn ObjectStoreExt>, config: &EngineConfig) -> Result<Self> {
        let catalog = MetadataStore::from_config(&config.store).await?;
        Ok(Self::new(store, catalog))
    }

    /// Runs the full pipeline over `prefix`: detect, read, normalize, save.
    ///
    /// Re-discovering a `table_name` already on record under a different
    /// format fails with [`DiscoveryError::FormatMismatch`] and leaves the
    /// stored row unchanged.
    pub async fn discover(&self, prefix: &str) -> Result<(TableMetadata, Vec<Diagnostic>)> {
        info!(prefix = %prefix, "starting discovery");
        let format = self.detector.detect(prefix).await?;

        let raw = match format {
            TableFormat::Iceberg => Raw::Iceberg(self.iceberg.read(prefix).await?),
            TableFormat::Delta => Raw::Delta(self.delta.read(prefix).await?),
            TableFormat::Hudi => Raw::Hudi(self.hudi.read(prefix).await?),
            TableFormat::Parquet => Raw::Parquet(self.parquet.read(prefix).await?),
        };

        let (meta, diagnostics) = normalizer::normalize(raw, Utc::now())?;

        if let Some(existing_format) = self.catalog.format_of(&meta.table_name).await? {
            if existing_format != meta.format {
                return Err(DiscoveryError::FormatMismatch {
                    table_name: meta.table_name.clone(),
                    existing: existing_format,
                    incoming: meta.format,
                });
            }
        }

        self.catalog.save(&meta).await?;
        info!(table = %meta.table_name, format = %meta.format, "discovered table");
        Ok((meta, diagnostics))
    }

    /// Fetches a previously discovered table's metadata.
    pub async fn get(&self, table_name: &str) -> Result<Option<TableMetadata>> {
        self.catalog.get(table_name).await
    }

    /// Lists discovered table names, optionally restricted to one format.
    pub async fn list(&self, format: Option<TableFormat>) -> Result<Vec<String>> {
        self.catalog.list(format).await
    }

    /// Removes a table's catalog entry. Does not touch its underlying data.
    pub async fn delete(&self, table_name: &str) -> Result<bool> {
        self.catalog.delete(table_name).await
    }

    /// Total number of tables on record.
    pub async fn count(&self) -> Result<u64> {
        self.catalog.count().await
    }

    /// Direct access to the underlying object store, for callers that need
    /// to inspect raw table data the engine doesn't surface.
    pub fn object_store(&self) -> &Arc<dyn ObjectStoreExt> {
        &self.store
    }
}
