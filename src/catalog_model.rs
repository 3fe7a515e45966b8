/*!
The format-neutral canonical model every reader normalizes into.

[`TableMetadata`] is what gets persisted by [`crate::store::MetadataStore`]
and returned from [`crate::engine::DiscoveryEngine`]; nothing downstream of
the normalizer ever looks at a format's native on-disk shape again.
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The table format a discovery run detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableFormat {
    /// Apache Iceberg.
    Iceberg,
    /// Delta Lake.
    Delta,
    /// Apache Hudi.
    Hudi,
    /// Plain Parquet files, optionally under Hive-style partition directories.
    Parquet,
}

impl std::fmt::Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TableFormat::Iceberg => "ICEBERG",
            TableFormat::Delta => "DELTA",
            TableFormat::Hudi => "HUDI",
            TableFormat::Parquet => "PARQUET",
        };
        f.write_str(s)
    }
}

/// A single column in a table's normalized schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name, exactly as declared by the source format.
    pub name: String,
    /// Normalized type name (see spec.md §4.7's type tables).
    pub data_type: String,
    /// Whether the column allows nulls.
    pub nullable: bool,
    /// Ordinal position within the schema, starting at 0.
    pub ordinal_position: usize,
    /// Iceberg `doc`/`comment`, Delta `metadata.comment`, or Hudi Avro `doc`,
    /// when the source format carries one.
    pub comment: Option<String>,
}

/// The canonical, format-neutral description of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// A stable identifier, unique within a store.
    pub table_name: String,
    /// The format this table was discovered as.
    pub format: TableFormat,
    /// The storage location the table was discovered at.
    pub location: String,
    /// All columns, in stable declaration order.
    pub columns: Vec<ColumnMetadata>,
    /// Names of columns that partition this table, a subset of
    /// `columns[].name`, in partition-spec order.
    pub partitions: Vec<String>,
    /// Source-format properties. Reserved prefixes (`iceberg.`, `delta.`,
    /// `hudi.`) carry format-specific state set by the normalizer; everything
    /// else passes through verbatim from the source.
    pub properties: std::collections::HashMap<String, String>,
    /// Whether the source format supports querying prior states of the
    /// table (Iceberg snapshots, Delta log versions, Hudi timelines of
    /// length ≥ 2). Plain Parquet does not.
    pub supports_time_travel: bool,
    /// Number of data files backing the table, when known.
    pub num_files: Option<u64>,
    /// Total size in bytes of the table's data files, when known.
    pub size_bytes: Option<u64>,
    /// Row count, when known.
    pub row_count: Option<u64>,
    /// When this table was first discovered.
    pub created_at: DateTime<Utc>,
    /// When this table's record was last refreshed by a `discover` call.
    pub updated_at: DateTime<Utc>,
}
