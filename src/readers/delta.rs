/*!
Reads a Delta Lake transaction log: finds the highest-version log file and
merges its `metaData`/`protocol` actions.
*/

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::catalog_model::TableFormat;
use crate::error::{DiscoveryError, Result};
use crate::object_store::ObjectStoreExt;

use super::{DeltaRaw, RawField};

/// Reads Delta Lake table metadata from an object-store prefix.
pub struct DeltaReader {
    store: Arc<dyn ObjectStoreExt>,
}

impl DeltaReader {
    /// Builds a reader over the given store.
    pub fn new(store: Arc<dyn ObjectStoreExt>) -> Self {
        DeltaReader { store }
    }

    /// Reads and parses the transaction log at `prefix`.
    pub async fn read(&self, prefix: &str) -> Result<DeltaRaw> {
        let log_prefix = format!("{prefix}_delta_log/");
        let entries = self.store.list(&log_prefix, 10_000).await?;

        let mut versions: Vec<(i64, String)> = entries
            .iter()
            .filter_map(|e| {
                let name = e.key.rsplit('/').next().unwrap_or(&e.key);
                if !name.ends_with(".json") || name.contains("checkpoint") {
                    return None;
                }
                name.trim_end_matches(".json")
                    .parse::<i64>()
                    .ok()
                    .map(|v| (v, e.key.clone()))
            })
            .collect();

        if versions.is_empty() {
            return Err(DiscoveryError::CorruptMetadata {
                format: TableFormat::Delta,
                reason: "no transaction log found under _delta_log/".to_string(),
            });
        }
        versions.sort_by_key(|(v, _)| *v);
        let (version, key) = versions.into_iter().next_back().unwrap();
        debug!(version, key = %key, "reading delta log version");

        let bytes = self.store.get(&key).await?;
        let text = String::from_utf8_lossy(&bytes);

        let mut meta_data: Option<MetaDataAction> = None;
        let mut protocol: Option<ProtocolAction> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let action: LogAction = serde_json::from_str(line).map_err(|err| {
                DiscoveryError::CorruptMetadata {
                    format: TableFormat::Delta,
                    reason: format!("malformed action line: {err}"),
                }
            })?;
            if let Some(m) = action.meta_data {
                meta_data = Some(m);
            }
            if let Some(p) = action.protocol {
                protocol = Some(p);
            }
        }

        let meta_data = meta_data.ok_or_else(|| DiscoveryError::CorruptMetadata {
            format: TableFormat::Delta,
            reason: "no metaData action found in log".to_string(),
        })?;

        let schema: DeltaSchema = serde_json::from_str(&meta_data.schema_string).map_err(|err| {
            DiscoveryError::CorruptMetadata {
                format: TableFormat::Delta,
                reason: format!("invalid schemaString: {err}"),
            }
        })?;

        let fields = schema
            .fields
            .into_iter()
            .map(|f| RawField {
                name: f.name,
                source_type: type_to_string(&f.r#type),
                nullable: f.nullable,
                comment: f
                    .metadata
                    .get("comment")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            })
            .collect();

        let mut properties = meta_data.configuration.clone();
        if let Some(name) = &meta_data.name {
            properties.insert("table.name".to_string(), name.clone());
        }
        if let Some(description) = &meta_data.description {
            properties.insert("table.description".to_string(), description.clone());
        }

        Ok(DeltaRaw {
            location: prefix.trim_end_matches('/').to_string(),
            version,
            fields,
            partition_columns: meta_data.partition_columns,
            properties,
            created_time: meta_data.created_time,
            min_reader_version: protocol.as_ref().map(|p| p.min_reader_version),
            min_writer_version: protocol.as_ref().map(|p| p.min_writer_version),
        })
    }
}

#[derive(Debug, Deserialize)]
struct LogAction {
    #[serde(rename = "metaData")]
    meta_data: Option<MetaDataAction>,
    protocol: Option<ProtocolAction>,
}

#[derive(Debug, Clone, Deserialize)]
struct MetaDataAction {
    name: Option<String>,
    description: Option<String>,
    #[serde(rename = "schemaString")]
    schema_string: String,
    #[serde(rename = "partitionColumns", default)]
    partition_columns: Vec<String>,
    #[serde(default)]
    configuration: HashMap<String, String>,
    #[serde(rename = "createdTime")]
    created_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ProtocolAction {
    #[serde(rename = "minReaderVersion")]
    min_reader_version: i32,
    #[serde(rename = "minWriterVersion")]
    min_writer_version: i32,
}

#[derive(Debug, Deserialize)]
struct DeltaSchema {
    fields: Vec<DeltaField>,
}

#[derive(Debug, Deserialize)]
struct DeltaField {
    name: String,
    r#type: Value,
    nullable: bool,
    #[serde(default)]
    metadata: HashMap<String, Value>,
}

fn type_to_string(t: &Value) -> String {
    match t {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
