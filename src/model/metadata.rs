/*!
Defines the [table metadata](https://iceberg.apache.org/spec/#table-metadata)
JSON document that lives under a table's `metadata/` directory.

Only the fields the discovery engine needs are modeled: extra keys present in
a real metadata file (sort orders, snapshot references, table UUID, ...) are
simply ignored by `serde` during deserialization.
*/
use std::collections::HashMap;

use serde::Deserialize;

use super::{partition::PartitionSpec, schema, snapshot::SnapshotV2};

/// Table metadata, normalized to the v2 shape regardless of the
/// `format-version` found on disk.
#[derive(Debug, PartialEq)]
pub struct IcebergTableMetadata {
    /// The table's base location, as recorded in the metadata file.
    pub location: String,
    /// Timestamp in milliseconds from the unix epoch when the table was last updated.
    pub last_updated_ms: i64,
    /// The `format-version` the metadata file declared (1 or 2).
    pub format_version: i32,
    /// All schemas known to the table.
    pub schemas: Vec<schema::SchemaV2>,
    /// ID of the table's current schema.
    pub current_schema_id: i32,
    /// All partition specs known to the table.
    pub partition_specs: Vec<PartitionSpec>,
    /// ID of the spec that should be used by default.
    pub default_spec_id: i32,
    /// A string-to-string map of table properties.
    pub properties: HashMap<String, String>,
    /// ID of the table's current snapshot, if any.
    pub current_snapshot_id: Option<i64>,
    /// All valid snapshots for the table.
    pub snapshots: Vec<SnapshotV2>,
}

impl IcebergTableMetadata {
    /// The schema referenced by `current-schema-id`.
    pub fn current_schema(&self) -> Option<&schema::SchemaV2> {
        self.schemas
            .iter()
            .find(|s| s.schema_id == self.current_schema_id)
    }

    /// The partition spec referenced by `default-spec-id`.
    pub fn default_spec(&self) -> Option<&PartitionSpec> {
        self.partition_specs
            .iter()
            .find(|spec| spec.spec_id == self.default_spec_id)
    }
}

impl<'de> Deserialize<'de> for IcebergTableMetadata {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Iceberg v1 metadata is missing fields v2 requires (last-sequence-number,
        // required current-schema-id/default-spec-id). Try v2 first; a v1 file
        // fails v2's required fields and falls through to v1, mirroring the
        // untagged-enum dispatch the on-disk format relies on since there is no
        // discriminant field usable before the schema is known.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Versioned {
            V2(MetadataV2),
            V1(MetadataV1),
        }

        Ok(match Versioned::deserialize(deserializer)? {
            Versioned::V2(v2) => v2.into(),
            Versioned::V1(v1) => v1.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct MetadataV2 {
    #[serde(rename = "format-version")]
    format_version: i32,
    location: String,
    last_updated_ms: i64,
    schemas: Vec<schema::SchemaV2>,
    current_schema_id: i32,
    partition_specs: Vec<PartitionSpec>,
    default_spec_id: i32,
    #[serde(default)]
    properties: Option<HashMap<String, String>>,
    current_snapshot_id: Option<i64>,
    #[serde(default)]
    snapshots: Option<Vec<SnapshotV2>>,
}

impl From<MetadataV2> for IcebergTableMetadata {
    fn from(v: MetadataV2) -> Self {
        IcebergTableMetadata {
            location: v.location,
            last_updated_ms: v.last_updated_ms,
            format_version: v.format_version,
            schemas: v.schemas,
            current_schema_id: v.current_schema_id,
            partition_specs: v.partition_specs,
            default_spec_id: v.default_spec_id,
            properties: v.properties.unwrap_or_default(),
            current_snapshot_id: v.current_snapshot_id,
            snapshots: v.snapshots.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct MetadataV1 {
    #[serde(rename = "format-version")]
    format_version: i32,
    location: String,
    last_updated_ms: i64,
    schema: schema::SchemaV1,
    #[serde(default)]
    schemas: Option<Vec<schema::SchemaV1>>,
    current_schema_id: Option<i32>,
    partition_spec: Vec<super::partition::PartitionField>,
    #[serde(default)]
    partition_specs: Option<Vec<PartitionSpec>>,
    default_spec_id: Option<i32>,
    #[serde(default)]
    properties: Option<HashMap<String, String>>,
    current_snapshot_id: Option<i64>,
    #[serde(default)]
    snapshots: Option<Vec<super::snapshot::SnapshotV1>>,
}

impl From<MetadataV1> for IcebergTableMetadata {
    fn from(v: MetadataV1) -> Self {
        let current_schema_id = v.current_schema_id.unwrap_or(0);
        let schemas = v
            .schemas
            .unwrap_or_else(|| vec![v.schema])
            .into_iter()
            .map(schema::SchemaV2::from)
            .collect();
        let default_spec_id = v.default_spec_id.unwrap_or(0);
        let partition_specs = v.partition_specs.unwrap_or_else(|| {
            vec![PartitionSpec {
                spec_id: default_spec_id,
                fields: v.partition_spec,
            }]
        });
        IcebergTableMetadata {
            location: v.location,
            last_updated_ms: v.last_updated_ms,
            format_version: v.format_version,
            schemas,
            current_schema_id,
            partition_specs,
            default_spec_id,
            properties: v.properties.unwrap_or_default(),
            current_snapshot_id: v.current_snapshot_id,
            snapshots: v
                .snapshots
                .unwrap_or_default()
                .into_iter()
                .map(SnapshotV2::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_v2_metadata() {
        let data = r#"
        {
            "format-version": 2,
            "table-uuid": "fb072c92-a02b-11e9-ae9c-1bb7bc9eca94",
            "location": "s3://b/wh/data.db/table",
            "last-sequence-number": 1,
            "last-updated-ms": 1515100955770,
            "last-column-id": 5,
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
            "last-partition-id": 1000,
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
            ],
            "sort-orders": [],
            "default-sort-order-id": 0
        }
        "#;
        let meta: IcebergTableMetadata = serde_json::from_str(data).unwrap();
        assert_eq!(meta.format_version, 2);
        assert_eq!(meta.current_schema().unwrap().schema_id, 1);
        assert_eq!(meta.default_spec().unwrap().spec_id, 1);
        assert_eq!(meta.snapshots.len(), 1);
        assert_eq!(meta.properties.get("owner").unwrap(), "root");
    }

    #[test]
    fn deserializes_v1_metadata_without_current_schema_id() {
        let data = r#"
        {
            "format-version": 1,
            "location": "/warehouse/nyc/taxis",
            "last-updated-ms": 1662532818843,
            "last-column-id": 5,
            "schema": {
                "type": "struct",
                "schema-id": 0,
                "fields": [
                    {"id": 1, "name": "vendor_id", "required": false, "type": "long"}
                ]
            },
            "partition-spec": [
                {"name": "vendor_id", "transform": "identity", "source-id": 1, "field-id": 1000}
            ],
            "default-spec-id": 0,
            "default-sort-order-id": 0
        }
        "#;
        let meta: IcebergTableMetadata = serde_json::from_str(data).unwrap();
        assert_eq!(meta.format_version, 1);
        assert_eq!(meta.current_schema_id, 0);
        assert_eq!(meta.default_spec().unwrap().fields[0].name, "vendor_id");
        assert!(meta.snapshots.is_empty());
    }
}
