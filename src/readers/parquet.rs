/*!
Reads a single Parquet file's footer: schema, row/row-group counts, and
Hive-style partition columns inferred from sibling object keys.

Only the first `.parquet` object under a prefix is opened; heterogeneous
layouts are not reconciled, matching spec.md's single-file-probe design.
*/

use std::sync::Arc;

use parquet::basic::{Repetition, Type as PhysicalType};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::schema::types::Type as SchemaType;

use crate::catalog_model::TableFormat;
use crate::error::{DiscoveryError, Result};
use crate::object_store::{ObjectInfo, ObjectStoreExt};

use super::{ParquetRaw, RawField};

/// Reads Parquet footer metadata from an object-store prefix.
pub struct ParquetReader {
    store: Arc<dyn ObjectStoreExt>,
}

impl ParquetReader {
    /// Builds a reader over the given store.
    pub fn new(store: Arc<dyn ObjectStoreExt>) -> Self {
        ParquetReader { store }
    }

    /// Reads and parses the first `.parquet` object directly under `prefix`.
    pub async fn read(&self, prefix: &str) -> Result<ParquetRaw> {
        let entries = self.store.list(prefix, 10_000).await?;
        let mut parquet_keys: Vec<&str> = entries
            .iter()
            .filter(|e| is_direct_child(prefix, &e.key) && e.key.ends_with(".parquet"))
            .map(|e| e.key.as_str())
            .collect();
        if parquet_keys.is_empty() {
            return Err(DiscoveryError::MissingArtifact {
                artifact: format!("{prefix}*.parquet"),
            });
        }
        parquet_keys.sort_unstable();

        let partition_fields = hive_partition_fields(&entries);

        let first_key = parquet_keys[0].to_string();
        let bytes = self.store.get(&first_key).await?;
        let reader =
            SerializedFileReader::new(bytes).map_err(|err| DiscoveryError::CorruptMetadata {
                format: TableFormat::Parquet,
                reason: err.to_string(),
            })?;
        let metadata = reader.metadata();
        let file_metadata = metadata.file_metadata();
        let fields = file_metadata
            .schema()
            .get_fields()
            .iter()
            .map(|f| schema_type_to_raw_field(f))
            .collect();

        Ok(ParquetRaw {
            location: prefix.trim_end_matches('/').to_string(),
            fields,
            num_rows: file_metadata.num_rows(),
            num_row_groups: metadata.num_row_groups(),
            partition_fields,
            file_count: parquet_keys.len(),
        })
    }
}

fn schema_type_to_raw_field(t: &SchemaType) -> RawField {
    let info = t.get_basic_info();
    let nullable = info.repetition() != Repetition::REQUIRED;
    let source_type = if t.is_primitive() {
        physical_type_name(t.get_physical_type())
    } else {
        "group".to_string()
    };
    RawField {
        name: info.name().to_string(),
        source_type,
        nullable,
        comment: None,
    }
}

fn physical_type_name(t: PhysicalType) -> String {
    match t {
        PhysicalType::BOOLEAN => "BOOLEAN",
        PhysicalType::INT32 => "INT32",
        PhysicalType::INT64 => "INT64",
        PhysicalType::INT96 => "INT96",
        PhysicalType::FLOAT => "FLOAT",
        PhysicalType::DOUBLE => "DOUBLE",
        PhysicalType::BYTE_ARRAY => "BYTE_ARRAY",
        PhysicalType::FIXED_LEN_BYTE_ARRAY => "FIXED_LEN_BYTE_ARRAY",
    }
    .to_string()
}

/// Whether `key` sits directly under `prefix`, with no further `/` between
/// them — partitioned sibling directories don't count.
fn is_direct_child(prefix: &str, key: &str) -> bool {
    key.strip_prefix(prefix)
        .map_or(false, |rest| !rest.contains('/'))
}

/// Derives partition column names from Hive-style `k=v` path segments
/// present anywhere in the listed keys, in first-seen order.
fn hive_partition_fields(entries: &[ObjectInfo]) -> Vec<String> {
    let mut seen = Vec::new();
    for entry in entries {
        for segment in entry.key.split('/') {
            if let Some((key, _value)) = segment.split_once('=') {
                if !seen.iter().any(|s: &String| s == key) {
                    seen.push(key.to_string());
                }
            }
        }
    }
    seen
}
