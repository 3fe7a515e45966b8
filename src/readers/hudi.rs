/*!
Reads Apache Hudi table metadata: `.hoodie/hoodie.properties` plus
schema recovery from the newest commit that embeds one.
*/

use std::collections::HashMap;
use std::sync::Arc;

use apache_avro::Schema as AvroSchema;
use serde_json::Value;
use tracing::debug;

use crate::error::{DiscoveryError, Result};
use crate::object_store::{ObjectInfo, ObjectStoreExt};

use super::{HudiRaw, RawField};

const COMMIT_EXTENSIONS: &[&str] = &[".commit", ".deltacommit", ".replacecommit", ".inflight"];

/// Reads Hudi table metadata from an object-store prefix.
pub struct HudiReader {
    store: Arc<dyn ObjectStoreExt>,
}

impl HudiReader {
    /// Builds a reader over the given store.
    pub fn new(store: Arc<dyn ObjectStoreExt>) -> Self {
        HudiReader { store }
    }

    /// Reads and parses the table at `prefix`.
    pub async fn read(&self, prefix: &str) -> Result<HudiRaw> {
        let hoodie_prefix = format!("{prefix}.hoodie/");
        let properties_key = format!("{hoodie_prefix}hoodie.properties");
        let properties_bytes =
            self.store
                .get(&properties_key)
                .await
                .map_err(|_| DiscoveryError::MissingArtifact {
                    artifact: properties_key.clone(),
                })?;
        let properties = parse_java_properties(&String::from_utf8_lossy(&properties_bytes));

        let mut timeline = self.store.list(&hoodie_prefix, 10_000).await?;
        timeline.retain(|e| is_commit_file(&e.key));
        timeline.sort_by(|a, b| a.last_modified.cmp(&b.last_modified));
        let timeline_len = timeline.len();

        let fields = self.recover_schema(timeline.iter().rev()).await;

        let table_name = properties
            .get("hoodie.table.name")
            .cloned()
            .unwrap_or_default();
        let table_type = properties
            .get("hoodie.table.type")
            .cloned()
            .unwrap_or_else(|| "COPY_ON_WRITE".to_string());
        let partition_fields = properties
            .get("hoodie.table.partition.fields")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let base_path = properties
            .get("hoodie.table.base.path")
            .cloned()
            .unwrap_or_else(|| prefix.trim_end_matches('/').to_string());

        Ok(HudiRaw {
            location: prefix.trim_end_matches('/').to_string(),
            table_name,
            table_type,
            fields,
            partition_fields,
            properties,
            timeline_len,
            base_path,
        })
    }

    async fn recover_schema<'a>(
        &self,
        newest_first: impl Iterator<Item = &'a ObjectInfo>,
    ) -> Vec<RawField> {
        for entry in newest_first {
            match self.try_schema_from_commit(&entry.key).await {
                Some(fields) => {
                    debug!(commit = %entry.key, "recovered schema");
                    return fields;
                }
                None => continue,
            }
        }
        Vec::new()
    }

    async fn try_schema_from_commit(&self, key: &str) -> Option<Vec<RawField>> {
        let bytes = self.store.get(key).await.ok()?;
        let commit: Value = serde_json::from_slice(&bytes).ok()?;
        let schema_value = commit.get("metadata")?.get("schema")?;
        let schema_text = match schema_value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let schema = AvroSchema::parse_str(&schema_text).ok()?;
        avro_record_fields(&schema)
    }
}

fn is_commit_file(key: &str) -> bool {
    let name = key.rsplit('/').next().unwrap_or(key);
    COMMIT_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn avro_record_fields(schema: &AvroSchema) -> Option<Vec<RawField>> {
    match schema {
        AvroSchema::Record(record) => Some(
            record
                .fields
                .iter()
                .map(|field| {
                    let (source_type, nullable) = field_type_string(&field.schema);
                    RawField {
                        name: field.name.clone(),
                        source_type,
                        nullable,
                        comment: field.doc.clone(),
                    }
                })
                .collect(),
        ),
        _ => None,
    }
}

fn field_type_string(schema: &AvroSchema) -> (String, bool) {
    match schema {
        AvroSchema::Union(union) => {
            let nullable = union.variants().iter().any(|v| matches!(v, AvroSchema::Null));
            let non_null = union.variants().iter().find(|v| !matches!(v, AvroSchema::Null));
            let type_name = non_null.map(avro_scalar_name).unwrap_or_else(|| "null".to_string());
            (type_name, nullable)
        }
        other => (avro_scalar_name(other), false),
    }
}

fn avro_scalar_name(schema: &AvroSchema) -> String {
    match schema {
        AvroSchema::Null => "null".to_string(),
        AvroSchema::Boolean => "boolean".to_string(),
        AvroSchema::Int => "int".to_string(),
        AvroSchema::Long => "long".to_string(),
        AvroSchema::Float => "float".to_string(),
        AvroSchema::Double => "double".to_string(),
        AvroSchema::Bytes => "bytes".to_string(),
        AvroSchema::String => "string".to_string(),
        AvroSchema::Date => "date".to_string(),
        AvroSchema::TimestampMillis | AvroSchema::TimestampMicros => "timestamp".to_string(),
        AvroSchema::TimeMillis | AvroSchema::TimeMicros => "time".to_string(),
        AvroSchema::Uuid => "string".to_string(),
        AvroSchema::Decimal { .. } => "bytes".to_string(),
        AvroSchema::Array(_) => "array".to_string(),
        AvroSchema::Map(_) => "map".to_string(),
        AvroSchema::Record(_) => "record".to_string(),
        AvroSchema::Enum { .. } => "string".to_string(),
        AvroSchema::Fixed { .. } => "bytes".to_string(),
        _ => "string".to_string(),
    }
}

/// Parses Java `.properties` syntax: `key=value`, `#`/`!` comments,
/// trailing-backslash line continuation. No `\uXXXX` unescaping is
/// attempted since Hudi never emits escaped keys in practice.
fn parse_java_properties(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let mut pending: Option<String> = None;

    for raw_line in text.lines() {
        let line = match pending.take() {
            Some(mut buf) => {
                buf.push_str(raw_line.trim_start());
                buf
            }
            None => raw_line.to_string(),
        };

        if let Some(stripped) = line.strip_suffix('\\') {
            pending = Some(stripped.to_string());
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use object_store::memory::InMemory;
    use object_store::path::Path;

    use super::*;

    #[test]
    fn parses_properties_with_comments() {
        let text = "# comment\nhoodie.table.name=sales\nhoodie.table.type=COPY_ON_WRITE\n";
        let props = parse_java_properties(text);
        assert_eq!(props.get("hoodie.table.name").unwrap(), "sales");
        assert_eq!(props.get("hoodie.table.type").unwrap(), "COPY_ON_WRITE");
    }

    #[tokio::test]
    async fn missing_properties_file_is_fatal() {
        let mem = InMemory::new();
        let store: Arc<dyn object_store::ObjectStore> = Arc::new(mem);
        let reader = HudiReader::new(store);
        let err = reader.read("wh/sales/").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingArtifact { .. }));
    }

    #[tokio::test]
    async fn counts_two_commits_and_defaults_table_type() {
        let mem = InMemory::new();
        let store: Arc<dyn object_store::ObjectStore> = Arc::new(mem);
        store
            .put(
                &Path::from("wh/sales/.hoodie/hoodie.properties"),
                "hoodie.table.name=sales_hudi\nhoodie.table.partition.fields=region\n".into(),
            )
            .await
            .unwrap();
        store
            .put(
                &Path::from("wh/sales/.hoodie/20230101000000.commit"),
                "{}".into(),
            )
            .await
            .unwrap();
        store
            .put(
                &Path::from("wh/sales/.hoodie/20230102000000.commit"),
                "{}".into(),
            )
            .await
            .unwrap();

        let reader = HudiReader::new(store);
        let raw = reader.read("wh/sales/").await.unwrap();
        assert_eq!(raw.table_name, "sales_hudi");
        assert_eq!(raw.table_type, "COPY_ON_WRITE");
        assert_eq!(raw.timeline_len, 2);
        assert_eq!(raw.partition_fields, vec!["region".to_string()]);
        assert!(raw.fields.is_empty());
    }

    #[tokio::test]
    async fn recovers_schema_from_newest_commit() {
        let mem = InMemory::new();
        let store: Arc<dyn object_store::ObjectStore> = Arc::new(mem);
        store
            .put(
                &Path::from("wh/sales/.hoodie/hoodie.properties"),
                "hoodie.table.name=sales_hudi\n".into(),
            )
            .await
            .unwrap();
        let avro_schema = serde_json::json!({
            "type": "record",
            "name": "sales_hudi_record",
            "fields": [
                {"name": "id", "type": "long"},
                {"name": "region", "type": ["null", "string"]}
            ]
        });
        let commit = serde_json::json!({"metadata": {"schema": avro_schema.to_string()}});
        store
            .put(
                &Path::from("wh/sales/.hoodie/20230101000000.commit"),
                commit.to_string().into(),
            )
            .await
            .unwrap();

        let reader = HudiReader::new(store);
        let raw = reader.read("wh/sales/").await.unwrap();
        assert_eq!(raw.fields.len(), 2);
        assert!(raw.fields.iter().any(|f| f.name == "region" && f.nullable));
    }
}
