/*!
Format-specific metadata readers and the raw records they hand to
[`crate::normalizer`].

Each reader parses one format's native on-disk layout into its own raw
record; [`Raw`] tags them into one type so the normalizer can dispatch on
format without the readers sharing a base type.
*/

pub mod delta;
pub mod hudi;
pub mod iceberg;
pub mod parquet;

use std::collections::HashMap;

/// A single column as read from a source format, before normalization.
///
/// `source_type` is the format-native type string (`"decimal(10,2)"`,
/// `"long"`, Avro union JSON, Arrow `DataType` debug string, ...); the
/// normalizer is the only place that interprets it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    /// Column name.
    pub name: String,
    /// Format-native type string.
    pub source_type: String,
    /// Whether the column allows nulls, as the source format records it.
    pub nullable: bool,
    /// A doc/comment string, when the source format carries one.
    pub comment: Option<String>,
}

/// Raw metadata produced by [`iceberg::IcebergReader`].
#[derive(Debug, Clone, PartialEq)]
pub struct IcebergRaw {
    /// Table base location.
    pub location: String,
    /// `last-updated-ms` from the metadata file.
    pub last_updated_ms: i64,
    /// The metadata file's declared `format-version`.
    pub format_version: i32,
    /// Current schema's fields, in declared order.
    pub fields: Vec<RawField>,
    /// Partition field names, resolved from `source-id` to schema field name.
    pub partition_fields: Vec<String>,
    /// All snapshot ids known to the table.
    pub snapshot_ids: Vec<i64>,
    /// The `current-snapshot-id`, if any.
    pub current_snapshot_id: Option<i64>,
    /// Table properties, verbatim.
    pub properties: HashMap<String, String>,
}

/// Raw metadata produced by [`delta::DeltaReader`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaRaw {
    /// Table base location (the prefix that was read).
    pub location: String,
    /// The highest transaction-log version read.
    pub version: i64,
    /// Schema fields from the last `metaData` action's `schemaString`.
    pub fields: Vec<RawField>,
    /// `partitionColumns` from the last `metaData` action.
    pub partition_columns: Vec<String>,
    /// The last `metaData` action's `configuration` map, plus `name` and
    /// `description` when present.
    pub properties: HashMap<String, String>,
    /// `createdTime` from the last `metaData` action, if present.
    pub created_time: Option<i64>,
    /// The last `protocol` action's `minReaderVersion`, if a protocol action
    /// was seen.
    pub min_reader_version: Option<i32>,
    /// The last `protocol` action's `minWriterVersion`, if a protocol action
    /// was seen.
    pub min_writer_version: Option<i32>,
}

/// Raw metadata produced by [`hudi::HudiReader`].
#[derive(Debug, Clone, PartialEq)]
pub struct HudiRaw {
    /// Table base location.
    pub location: String,
    /// `hoodie.table.name`.
    pub table_name: String,
    /// `hoodie.table.type`, defaulting to `COPY_ON_WRITE` when absent.
    pub table_type: String,
    /// Schema fields recovered from the newest parseable commit, or empty if
    /// none parsed.
    pub fields: Vec<RawField>,
    /// `hoodie.table.partition.fields`, comma-split.
    pub partition_fields: Vec<String>,
    /// `hoodie.properties`, verbatim, minus the keys already surfaced above.
    pub properties: HashMap<String, String>,
    /// Number of timeline entries found under `.hoodie/`.
    pub timeline_len: usize,
    /// `hoodie.table.base.path`, falling back to `location`.
    pub base_path: String,
}

/// Raw metadata produced by [`parquet::ParquetReader`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParquetRaw {
    /// Table base location.
    pub location: String,
    /// Schema fields from the probed file's footer.
    pub fields: Vec<RawField>,
    /// Row count from the probed file's footer.
    pub num_rows: i64,
    /// Row-group count from the probed file's footer.
    pub num_row_groups: usize,
    /// Partition field names, derived from Hive-style `k=v` path segments.
    pub partition_fields: Vec<String>,
    /// Number of `.parquet` objects found under the prefix.
    pub file_count: usize,
}

/// One format's raw metadata record, tagged by format.
#[derive(Debug, Clone, PartialEq)]
pub enum Raw {
    /// Apache Iceberg.
    Iceberg(IcebergRaw),
    /// Delta Lake.
    Delta(DeltaRaw),
    /// Apache Hudi.
    Hudi(HudiRaw),
    /// Plain Parquet.
    Parquet(ParquetRaw),
}
