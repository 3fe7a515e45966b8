/*!
Defines [`DiscoveryError`] and the crate-wide [`Result`] alias.

One variant per error kind a discovery pipeline stage can produce. Each
variant carries exactly the structured context a caller needs to diagnose
the failure without re-reading storage.
*/

use thiserror::Error;

use crate::catalog_model::TableFormat;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// All ways a discovery pipeline stage can fail.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// No known format sentinel was found under the probed prefix.
    #[error("no recognized table format found at {uri}")]
    Unrecognized {
        /// The URI that was probed.
        uri: String,
    },

    /// The object store denied access while probing for a format sentinel.
    #[error("access denied while detecting format at {uri}: {cause}")]
    DetectionAccessDenied {
        /// The URI that was probed.
        uri: String,
        /// The underlying object-store error.
        cause: String,
    },

    /// The object store reported the prefix does not exist.
    #[error("not found while detecting format at {uri}: {cause}")]
    DetectionNotFound {
        /// The URI that was probed.
        uri: String,
        /// The underlying object-store error.
        cause: String,
    },

    /// On-disk metadata was syntactically invalid or structurally inconsistent.
    #[error("corrupt {format} metadata: {reason}")]
    CorruptMetadata {
        /// The format whose metadata failed to parse.
        format: TableFormat,
        /// Human-readable description of what was wrong.
        reason: String,
    },

    /// An artifact the reader expected to find was absent.
    #[error("missing artifact: {artifact}")]
    MissingArtifact {
        /// The path or file name that was expected.
        artifact: String,
    },

    /// The object store failed while a reader was reading table data.
    #[error("object store transport error while reading: {cause}")]
    ReadTransport {
        /// The underlying object-store error.
        cause: String,
    },

    /// A partition referenced a column name absent from the schema.
    #[error("unknown partition column: {name}")]
    UnknownPartitionColumn {
        /// The offending partition column name.
        name: String,
    },

    /// An Iceberg partition spec field referenced a `source-id` with no
    /// matching schema field.
    #[error("partition spec references dangling source-id {id}")]
    DanglingPartitionSourceId {
        /// The unresolved field id.
        id: i32,
    },

    /// A source property used a reserved namespace prefix
    /// (`iceberg.`/`delta.`/`hudi.`).
    #[error("source property '{key}' collides with the reserved '{format}' namespace")]
    PropertyNamespaceConflict {
        /// The format whose reserved prefix was collided with.
        format: TableFormat,
        /// The offending property key.
        key: String,
    },

    /// A re-discovery of `table_name` reported a different format than the
    /// one already on record.
    #[error("format mismatch for table '{table_name}': existing={existing}, incoming={incoming}")]
    FormatMismatch {
        /// The table whose format would have changed.
        table_name: String,
        /// The format already stored.
        existing: TableFormat,
        /// The format the new discovery produced.
        incoming: TableFormat,
    },

    /// The catalog backend failed (connection, constraint violation, transport).
    #[error("catalog storage error: {0}")]
    StorageBackend(String),
}

/// A recoverable condition surfaced alongside a successful `discover`, never
/// converted into a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A source type had no mapping and was degraded to `VARCHAR`.
    TypeDegraded {
        /// The unrecognized source type name.
        source_type: String,
    },
    /// A Hudi reader could not recover a schema from any commit in the
    /// timeline; the table was normalized with zero columns.
    HudiSchemaRecoveryFailed {
        /// Number of timeline entries that were attempted.
        commits_attempted: usize,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::TypeDegraded { source_type } => {
                write!(f, "unknown source type '{source_type}' degraded to VARCHAR")
            }
            Diagnostic::HudiSchemaRecoveryFailed { commits_attempted } => write!(
                f,
                "could not recover a schema from any of {commits_attempted} commits"
            ),
        }
    }
}
