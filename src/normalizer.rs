/*!
Collapses the four raw metadata shapes into the canonical [`TableMetadata`].

This is the only place that knows both a source format's type vocabulary
and the target SQL-style vocabulary; everything downstream of here is
format-neutral.
*/

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::catalog_model::{ColumnMetadata, TableFormat, TableMetadata};
use crate::error::{Diagnostic, DiscoveryError, Result};
use crate::readers::{DeltaRaw, HudiRaw, IcebergRaw, ParquetRaw, Raw, RawField};

const RESERVED_PREFIXES: &[&str] = &["iceberg.", "delta.", "hudi."];

/// Normalizes one raw metadata record into the canonical model.
///
/// Returns the normalized metadata alongside any recoverable diagnostics
/// (degraded types, failed Hudi schema recovery) collected along the way.
pub fn normalize(raw: Raw, now: DateTime<Utc>) -> Result<(TableMetadata, Vec<Diagnostic>)> {
    match raw {
        Raw::Iceberg(r) => normalize_iceberg(r, now),
        Raw::Delta(r) => normalize_delta(r, now),
        Raw::Hudi(r) => normalize_hudi(r, now),
        Raw::Parquet(r) => normalize_parquet(r, now),
    }
}

fn normalize_iceberg(raw: IcebergRaw, now: DateTime<Utc>) -> Result<(TableMetadata, Vec<Diagnostic>)> {
    let mut diagnostics = Vec::new();
    let columns = map_columns(&raw.fields, &mut diagnostics, map_iceberg_type);

    check_partition_subset(&raw.partition_fields, &columns)?;

    let mut properties = raw.properties;
    check_no_reserved_collision(&properties, TableFormat::Iceberg)?;
    properties.insert(
        "iceberg.format_version".to_string(),
        raw.format_version.to_string(),
    );
    if let Some(snapshot_id) = raw.current_snapshot_id {
        properties.insert(
            "iceberg.current_snapshot_id".to_string(),
            snapshot_id.to_string(),
        );
    }

    let table_name = table_name_from_location(&raw.location);

    Ok((
        TableMetadata {
            table_name,
            format: TableFormat::Iceberg,
            location: raw.location,
            columns,
            partitions: raw.partition_fields,
            properties,
            supports_time_travel: !raw.snapshot_ids.is_empty(),
            num_files: None,
            size_bytes: None,
            row_count: None,
            created_at: now,
            updated_at: now,
        },
        diagnostics,
    ))
}

fn normalize_delta(raw: DeltaRaw, now: DateTime<Utc>) -> Result<(TableMetadata, Vec<Diagnostic>)> {
    let mut diagnostics = Vec::new();
    let columns = map_columns(&raw.fields, &mut diagnostics, map_delta_type);

    check_partition_subset(&raw.partition_columns, &columns)?;

    let mut properties = raw.properties;
    check_no_reserved_collision(&properties, TableFormat::Delta)?;
    properties.insert("delta.version".to_string(), raw.version.to_string());
    if let Some(v) = raw.min_reader_version {
        properties.insert("delta.minReaderVersion".to_string(), v.to_string());
    }
    if let Some(v) = raw.min_writer_version {
        properties.insert("delta.minWriterVersion".to_string(), v.to_string());
    }

    let table_name = properties
        .get("table.name")
        .cloned()
        .unwrap_or_else(|| table_name_from_location(&raw.location));

    Ok((
        TableMetadata {
            table_name,
            format: TableFormat::Delta,
            location: raw.location,
            columns,
            partitions: raw.partition_columns,
            properties,
            supports_time_travel: true,
            num_files: None,
            size_bytes: None,
            row_count: None,
            created_at: now,
            updated_at: now,
        },
        diagnostics,
    ))
}

fn normalize_hudi(raw: HudiRaw, now: DateTime<Utc>) -> Result<(TableMetadata, Vec<Diagnostic>)> {
    let mut diagnostics = Vec::new();
    let columns = map_columns(&raw.fields, &mut diagnostics, map_hudi_type);

    if raw.fields.is_empty() && raw.timeline_len > 0 {
        let diagnostic = Diagnostic::HudiSchemaRecoveryFailed {
            commits_attempted: raw.timeline_len,
        };
        warn!(commits_attempted = raw.timeline_len, "hudi schema recovery failed");
        diagnostics.push(diagnostic);
    }

    check_partition_subset(&raw.partition_fields, &columns)?;

    let mut properties = raw.properties;
    check_no_reserved_collision(&properties, TableFormat::Hudi)?;
    properties.insert("hudi.table.type".to_string(), raw.table_type.clone());
    properties.insert(
        "hudi.commits.count".to_string(),
        raw.timeline_len.to_string(),
    );
    properties.insert("hudi.base_path".to_string(), raw.base_path);

    let table_name = if raw.table_name.is_empty() {
        table_name_from_location(&raw.location)
    } else {
        raw.table_name
    };

    Ok((
        TableMetadata {
            table_name,
            format: TableFormat::Hudi,
            location: raw.location,
            columns,
            partitions: raw.partition_fields,
            properties,
            supports_time_travel: raw.timeline_len >= 2,
            num_files: None,
            size_bytes: None,
            row_count: None,
            created_at: now,
            updated_at: now,
        },
        diagnostics,
    ))
}

fn normalize_parquet(raw: ParquetRaw, now: DateTime<Utc>) -> Result<(TableMetadata, Vec<Diagnostic>)> {
    let mut diagnostics = Vec::new();
    let columns = map_columns(&raw.fields, &mut diagnostics, map_parquet_type);

    check_partition_subset(&raw.partition_fields, &columns)?;

    let table_name = table_name_from_location(&raw.location);

    Ok((
        TableMetadata {
            table_name,
            format: TableFormat::Parquet,
            location: raw.location,
            columns,
            partitions: raw.partition_fields,
            properties: HashMap::new(),
            supports_time_travel: false,
            num_files: Some(raw.file_count as u64),
            size_bytes: None,
            row_count: if raw.num_rows >= 0 {
                Some(raw.num_rows as u64)
            } else {
                None
            },
            created_at: now,
            updated_at: now,
        },
        diagnostics,
    ))
}

fn map_columns(
    fields: &[RawField],
    diagnostics: &mut Vec<Diagnostic>,
    map_type: impl Fn(&str) -> Option<String>,
) -> Vec<ColumnMetadata> {
    fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let data_type = map_type(&f.source_type).unwrap_or_else(|| {
                warn!(source_type = %f.source_type, "unknown source type degraded to VARCHAR");
                diagnostics.push(Diagnostic::TypeDegraded {
                    source_type: f.source_type.clone(),
                });
                "VARCHAR".to_string()
            });
            ColumnMetadata {
                name: f.name.clone(),
                data_type,
                nullable: f.nullable,
                ordinal_position: i,
                comment: f.comment.clone(),
            }
        })
        .collect()
}

fn check_partition_subset(partitions: &[String], columns: &[ColumnMetadata]) -> Result<()> {
    for name in partitions {
        if !columns.iter().any(|c| &c.name == name) {
            return Err(DiscoveryError::UnknownPartitionColumn { name: name.clone() });
        }
    }
    Ok(())
}

fn check_no_reserved_collision(
    properties: &HashMap<String, String>,
    format: TableFormat,
) -> Result<()> {
    for key in properties.keys() {
        if RESERVED_PREFIXES.iter().any(|prefix| key.starts_with(prefix)) {
            return Err(DiscoveryError::PropertyNamespaceConflict {
                format,
                key: key.clone(),
            });
        }
    }
    Ok(())
}

fn table_name_from_location(location: &str) -> String {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(location)
        .to_string()
}

lazy_static! {
    static ref DECIMAL_RE: Regex = Regex::new(r"^decimal\((\d+),\s*(\d+)\)$").unwrap();
}

fn map_iceberg_type(source: &str) -> Option<String> {
    if let Some(caps) = DECIMAL_RE.captures(source) {
        return Some(format!("DECIMAL({},{})", &caps[1], &caps[2]));
    }
    if source.starts_with("fixed[") {
        return Some("BINARY".to_string());
    }
    Some(
        match source {
            "boolean" => "BOOLEAN",
            "int" => "INTEGER",
            "long" => "BIGINT",
            "float" => "FLOAT",
            "double" => "DOUBLE",
            "date" => "DATE",
            "time" => "TIME",
            "timestamp" => "TIMESTAMP",
            "timestamptz" => "TIMESTAMP WITH TIME ZONE",
            "string" => "VARCHAR",
            "uuid" => "UUID",
            "binary" => "BINARY",
            _ => return None,
        }
        .to_string(),
    )
}

fn map_delta_type(source: &str) -> Option<String> {
    if let Some(caps) = DECIMAL_RE.captures(source) {
        return Some(format!("DECIMAL({},{})", &caps[1], &caps[2]));
    }
    Some(
        match source {
            "boolean" => "BOOLEAN",
            "byte" => "TINYINT",
            "short" => "SMALLINT",
            "integer" => "INTEGER",
            "long" => "BIGINT",
            "float" => "FLOAT",
            "double" => "DOUBLE",
            "decimal" => "DECIMAL",
            "string" => "VARCHAR",
            "binary" => "BINARY",
            "date" => "DATE",
            "timestamp" => "TIMESTAMP",
            _ => return None,
        }
        .to_string(),
    )
}

fn map_hudi_type(source: &str) -> Option<String> {
    Some(
        match source {
            "boolean" => "BOOLEAN",
            "int" => "INTEGER",
            "long" => "BIGINT",
            "float" => "FLOAT",
            "double" => "DOUBLE",
            "string" => "VARCHAR",
            "bytes" => "BINARY",
            "date" => "DATE",
            "timestamp" => "TIMESTAMP",
            _ => return None,
        }
        .to_string(),
    )
}

/// Parquet's physical-type vocabulary (no logical-type annotations are read
/// from the footer, so e.g. UTF8-annotated `BYTE_ARRAY` and raw binary both
/// map to `VARCHAR`; a future revision may read `ConvertedType` to split
/// these).
fn map_parquet_type(source: &str) -> Option<String> {
    Some(
        match source {
            "BOOLEAN" => "BOOLEAN",
            "INT32" => "INTEGER",
            "INT64" => "BIGINT",
            "INT96" => "TIMESTAMP",
            "FLOAT" => "FLOAT",
            "DOUBLE" => "DOUBLE",
            "BYTE_ARRAY" => "VARCHAR",
            "FIXED_LEN_BYTE_ARRAY" => "BINARY",
            _ => return None,
        }
        .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, source_type: &str, nullable: bool) -> RawField {
        RawField {
            name: name.to_string(),
            source_type: source_type.to_string(),
            nullable,
            comment: None,
        }
    }

    #[test]
    fn iceberg_happy_path_maps_types_and_partitions() {
        let raw = IcebergRaw {
            location: "s3://bucket/wh/orders".to_string(),
            last_updated_ms: 0,
            format_version: 2,
            fields: vec![
                field("order_id", "long", false),
                field("region", "string", true),
            ],
            partition_fields: vec!["region".to_string()],
            snapshot_ids: vec![123],
            current_snapshot_id: Some(123),
            properties: HashMap::new(),
        };
        let (meta, diags) = normalize(Raw::Iceberg(raw), Utc::now()).unwrap();
        assert!(diags.is_empty());
        assert_eq!(meta.format, TableFormat::Iceberg);
        assert_eq!(meta.columns[0].data_type, "BIGINT");
        assert_eq!(meta.columns[1].data_type, "VARCHAR");
        assert_eq!(meta.partitions, vec!["region".to_string()]);
        assert!(meta.supports_time_travel);
        assert_eq!(meta.properties.get("iceberg.format_version").unwrap(), "2");
    }

    #[test]
    fn unknown_partition_column_is_an_error() {
        let raw = IcebergRaw {
            location: "s3://bucket/wh/orders".to_string(),
            last_updated_ms: 0,
            format_version: 2,
            fields: vec![field("order_id", "long", false)],
            partition_fields: vec!["missing".to_string()],
            snapshot_ids: vec![],
            current_snapshot_id: None,
            properties: HashMap::new(),
        };
        let err = normalize(Raw::Iceberg(raw), Utc::now()).unwrap_err();
        assert!(matches!(err, DiscoveryError::UnknownPartitionColumn { .. }));
    }

    #[test]
    fn unknown_type_degrades_to_varchar_with_diagnostic() {
        let raw = DeltaRaw {
            location: "wh/events".to_string(),
            version: 0,
            fields: vec![field("payload", "map<string,string>", true)],
            partition_columns: vec![],
            properties: HashMap::new(),
            created_time: None,
            min_reader_version: None,
            min_writer_version: None,
        };
        let (meta, diags) = normalize(Raw::Delta(raw), Utc::now()).unwrap();
        assert_eq!(meta.columns[0].data_type, "VARCHAR");
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0], Diagnostic::TypeDegraded { .. }));
    }

    #[test]
    fn reserved_property_prefix_collision_fails() {
        let mut properties = HashMap::new();
        properties.insert("delta.version".to_string(), "99".to_string());
        let raw = DeltaRaw {
            location: "wh/events".to_string(),
            version: 0,
            fields: vec![],
            partition_columns: vec![],
            properties,
            created_time: None,
            min_reader_version: None,
            min_writer_version: None,
        };
        let err = normalize(Raw::Delta(raw), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::PropertyNamespaceConflict { .. }
        ));
    }

    #[test]
    fn hudi_two_commits_supports_time_travel() {
        let raw = HudiRaw {
            location: "wh/sales".to_string(),
            table_name: "sales_hudi".to_string(),
            table_type: "COPY_ON_WRITE".to_string(),
            fields: vec![],
            partition_fields: vec![],
            properties: HashMap::new(),
            timeline_len: 2,
            base_path: "wh/sales".to_string(),
        };
        let (meta, diags) = normalize(Raw::Hudi(raw), Utc::now()).unwrap();
        assert!(meta.supports_time_travel);
        assert!(diags.is_empty());
        assert_eq!(meta.properties.get("hudi.commits.count").unwrap(), "2");
    }

    #[test]
    fn hudi_empty_schema_with_commits_emits_recovery_diagnostic() {
        let raw = HudiRaw {
            location: "wh/sales".to_string(),
            table_name: "sales_hudi".to_string(),
            table_type: "COPY_ON_WRITE".to_string(),
            fields: vec![],
            partition_fields: vec![],
            properties: HashMap::new(),
            timeline_len: 3,
            base_path: "wh/sales".to_string(),
        };
        let (_, diags) = normalize(Raw::Hudi(raw), Utc::now()).unwrap();
        assert_eq!(diags.len(), 1);
        assert!(matches!(
            diags[0],
            Diagnostic::HudiSchemaRecoveryFailed { commits_attempted: 3 }
        ));
    }

    #[test]
    fn parquet_never_supports_time_travel() {
        let raw = ParquetRaw {
            location: "wh/t".to_string(),
            fields: vec![
                field("user_id", "INT64", false),
                field("country", "BYTE_ARRAY", true),
            ],
            num_rows: 10,
            num_row_groups: 1,
            partition_fields: vec!["country".to_string()],
            file_count: 2,
        };
        let (meta, _) = normalize(Raw::Parquet(raw), Utc::now()).unwrap();
        assert!(!meta.supports_time_travel);
        assert_eq!(meta.row_count, Some(10));
        assert_eq!(meta.num_files, Some(2));
    }
}
