/*!
Reads Apache Iceberg table metadata: locates the current metadata file,
parses it, and resolves partition fields to schema column names.
*/

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{DiscoveryError, Result};
use crate::model::metadata::IcebergTableMetadata;
use crate::model::schema::{AllType, PrimitiveType, SchemaV2, StructField};
use crate::object_store::ObjectStoreExt;

use super::{IcebergRaw, RawField};

/// Reads Iceberg table metadata from an object-store prefix.
pub struct IcebergReader {
    store: Arc<dyn ObjectStoreExt>,
}

impl IcebergReader {
    /// Builds a reader over the given store.
    pub fn new(store: Arc<dyn ObjectStoreExt>) -> Self {
        IcebergReader { store }
    }

    /// Reads and parses the table at `prefix`.
    pub async fn read(&self, prefix: &str) -> Result<IcebergRaw> {
        let metadata_prefix = format!("{prefix}metadata/");
        let current_file = self.locate_current_metadata_file(&metadata_prefix).await?;
        debug!(file = %current_file, "reading iceberg metadata file");

        let bytes = self.store.get(&current_file).await?;
        let metadata: IcebergTableMetadata =
            serde_json::from_slice(&bytes).map_err(|err| DiscoveryError::CorruptMetadata {
                format: crate::catalog_model::TableFormat::Iceberg,
                reason: err.to_string(),
            })?;

        let schema = metadata.current_schema().ok_or_else(|| DiscoveryError::CorruptMetadata {
            format: crate::catalog_model::TableFormat::Iceberg,
            reason: format!(
                "current-schema-id {} matches no entry in schemas[]",
                metadata.current_schema_id
            ),
        })?;

        let fields = schema_fields(schema);
        let id_to_name = field_id_index(schema);

        let partition_fields = match metadata.default_spec() {
            Some(spec) => spec
                .fields
                .iter()
                .map(|f| {
                    id_to_name
                        .get(&f.source_id)
                        .cloned()
                        .ok_or(DiscoveryError::DanglingPartitionSourceId { id: f.source_id })
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(IcebergRaw {
            location: metadata.location,
            last_updated_ms: metadata.last_updated_ms,
            format_version: metadata.format_version,
            fields,
            partition_fields,
            snapshot_ids: metadata.snapshots.iter().map(|s| s.snapshot_id).collect(),
            current_snapshot_id: metadata.current_snapshot_id,
            properties: metadata.properties,
        })
    }

    async fn locate_current_metadata_file(&self, metadata_prefix: &str) -> Result<String> {
        let hint_path = format!("{metadata_prefix}version-hint.text");
        if let Ok(bytes) = self.store.get(&hint_path).await {
            let file_name = String::from_utf8_lossy(&bytes).trim().to_string();
            if !file_name.is_empty() {
                let candidate = format!("{metadata_prefix}{file_name}");
                if self.store.head(&candidate).await.is_ok() {
                    return Ok(candidate);
                }
            }
        }

        let mut entries = self.store.list(metadata_prefix, 1000).await?;
        entries.retain(|e| e.key.ends_with(".metadata.json"));
        if entries.is_empty() {
            return Err(DiscoveryError::MissingArtifact {
                artifact: format!("{metadata_prefix}*.metadata.json"),
            });
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key).then(a.last_modified.cmp(&b.last_modified)));
        Ok(entries.into_iter().next_back().unwrap().key)
    }
}

fn field_id_index(schema: &SchemaV2) -> HashMap<i32, String> {
    schema
        .struct_fields
        .fields
        .iter()
        .map(|f| (f.id, f.name.clone()))
        .collect()
}

fn schema_fields(schema: &SchemaV2) -> Vec<RawField> {
    schema
        .struct_fields
        .fields
        .iter()
        .map(struct_field_to_raw)
        .collect()
}

fn struct_field_to_raw(field: &StructField) -> RawField {
    RawField {
        name: field.name.clone(),
        source_type: all_type_string(&field.field_type),
        nullable: !field.required,
        comment: field.doc.clone(),
    }
}

fn all_type_string(t: &AllType) -> String {
    match t {
        AllType::Primitive(p) => primitive_type_string(p),
        AllType::Struct(_) => "struct".to_string(),
        AllType::List(_) => "list".to_string(),
        AllType::Map(_) => "map".to_string(),
    }
}

fn primitive_type_string(p: &PrimitiveType) -> String {
    match p {
        PrimitiveType::Boolean => "boolean".to_string(),
        PrimitiveType::Int => "int".to_string(),
        PrimitiveType::Long => "long".to_string(),
        PrimitiveType::Float => "float".to_string(),
        PrimitiveType::Double => "double".to_string(),
        PrimitiveType::Decimal { precision, scale } => format!("decimal({precision},{scale})"),
        PrimitiveType::Date => "date".to_string(),
        PrimitiveType::Time => "time".to_string(),
        PrimitiveType::Timestamp => "timestamp".to_string(),
        PrimitiveType::Timestampz => "timestamptz".to_string(),
        PrimitiveType::String => "string".to_string(),
        PrimitiveType::Uuid => "uuid".to_string(),
        PrimitiveType::Fixed(len) => format!("fixed[{len}]"),
        PrimitiveType::Binary => "binary".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use object_store::memory::InMemory;
    use object_store::path::Path;

    use super::*;

    fn metadata_json() -> &'static str {
        r#"
        {
            "format-version": 2,
            "location": "s3://bucket/wh/orders",
            "last-updated-ms": 1515100955770,
            "schemas": [
                {
                    "schema-id": 1,
                    "type": "struct",
                    "fields": [
                        {"id": 1, "name": "order_id", "required": true, "type": "long"},
                        {"id": 5, "name": "region", "required": false, "type": "string"}
                    ]
                }
            ],
            "current-schema-id": 1,
            "partition-specs": [
                {
                    "spec-id": 1,
                    "fields": [
                        {"source-id": 5, "field-id": 1000, "name": "region", "transform": "identity"}
                    ]
                }
            ],
            "default-spec-id": 1,
            "properties": {"owner": "root"},
            "current-snapshot-id": 123,
            "snapshots": [
                {
                    "snapshot-id": 123,
                    "sequence-number": 1,
                    "timestamp-ms": 1515100955770,
                    "manifest-list": "s3://b/wh/.../s1.avro",
                    "summary": {"operation": "append"}
                }
            ]
        }
        "#
    }

    #[tokio::test]
    async fn reads_current_metadata_via_version_hint() {
        let mem = InMemory::new();
        let store: Arc<dyn object_store::ObjectStore> = Arc::new(mem);
        store
            .put(
                &Path::from("wh/orders/metadata/v1.metadata.json"),
                metadata_json().into(),
            )
            .await
            .unwrap();
        store
            .put(
                &Path::from("wh/orders/metadata/version-hint.text"),
                "v1.metadata.json".into(),
            )
            .await
            .unwrap();

        let reader = IcebergReader::new(store);
        let raw = reader.read("wh/orders/").await.unwrap();
        assert_eq!(raw.fields.len(), 2);
        assert_eq!(raw.partition_fields, vec!["region".to_string()]);
        assert_eq!(raw.current_snapshot_id, Some(123));
    }

    #[tokio::test]
    async fn falls_back_to_lexicographic_metadata_file() {
        let mem = InMemory::new();
        let store: Arc<dyn object_store::ObjectStore> = Arc::new(mem);
        store
            .put(
                &Path::from("wh/orders/metadata/00000-aaa.metadata.json"),
                metadata_json().into(),
            )
            .await
            .unwrap();

        let reader = IcebergReader::new(store);
        let raw = reader.read("wh/orders/").await.unwrap();
        assert_eq!(raw.format_version, 2);
    }

    #[tokio::test]
    async fn missing_metadata_directory_is_missing_artifact() {
        let mem = InMemory::new();
        let store: Arc<dyn object_store::ObjectStore> = Arc::new(mem);
        let reader = IcebergReader::new(store);
        let err = reader.read("wh/orders/").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingArtifact { .. }));
    }
}
