/*!
Details of [snapshots](https://iceberg.apache.org/spec/#snapshots) for a table.

A [SnapshotV2] contains a pointer to the ManifestList as well as supporting data for the Snapshot.
*/
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// The type of operations included in the snapshot, this allows
/// certain snapshots to be skipped during operation.
pub enum Operation {
    /// Only data files were added and no files were removed.
    Append,
    /// Data and delete files were added and removed without changing
    /// table data; i.e., compaction, changing the data file format,
    /// or relocating data files.
    Replace,
    /// Data and delete files were added and removed in a logical
    /// overwrite operation.
    Overwrite,
    /// Data files were removed and their contents logically deleted
    /// and/or delete files were added to delete rows.
    Delete,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
/// Summarises the changes in the snapshot.
pub struct Summary {
    /// The type of operation in the snapshot
    pub operation: Option<Operation>,
    /// Other summary data.
    #[serde(flatten)]
    pub other: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
/// A V2 compliant snapshot.
pub struct SnapshotV2 {
    /// A unique long ID
    pub snapshot_id: i64,
    /// The snapshot ID of the snapshot’s parent.
    /// Omitted for any snapshot with no parent
    pub parent_snapshot_id: Option<i64>,
    /// A monotonically increasing long that tracks the order of
    /// changes to a table.
    pub sequence_number: i64,
    /// A timestamp when the snapshot was created, used for garbage
    /// collection and table inspection
    pub timestamp_ms: i64,
    /// The location of a manifest list for this snapshot that
    /// tracks manifest files with additional metadata.
    pub manifest_list: String,
    /// A string map that summarizes the snapshot changes, including operation.
    pub summary: Summary,
    /// ID of the table’s current schema when the snapshot was created.
    pub schema_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
/// A V1 compliant snapshot.
pub struct SnapshotV1 {
    /// A unique long ID
    pub snapshot_id: i64,
    /// The snapshot ID of the snapshot’s parent.
    /// Omitted for any snapshot with no parent
    pub parent_snapshot_id: Option<i64>,
    /// A timestamp when the snapshot was created, used for garbage
    /// collection and table inspection
    pub timestamp_ms: i64,
    /// The location of a manifest list for this snapshot that
    /// tracks manifest files with additional metadata.
    pub manifest_list: Option<String>,
    /// A list of manifest file locations. Must be omitted if manifest-list is present
    pub manisfests: Option<Vec<String>>,
    /// A string map that summarizes the snapshot changes, including operation.
    pub summary: Option<Summary>,
    /// ID of the table’s current schema when the snapshot was created.
    pub schema_id: Option<i64>,
}

impl From<SnapshotV1> for SnapshotV2 {
    fn from(v1: SnapshotV1) -> Self {
        SnapshotV2 {
            snapshot_id: v1.snapshot_id,
            parent_snapshot_id: v1.parent_snapshot_id,
            sequence_number: 0,
            timestamp_ms: v1.timestamp_ms,
            manifest_list: v1.manifest_list.unwrap_or("".to_owned()),
            summary: v1.summary.unwrap_or(Summary {
                operation: None,
                other: HashMap::new(),
            }),
            schema_id: v1.schema_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_v2() {
        let data = r#"
            {
                "snapshot-id": 3051729675574597004,  
                "sequence-number": 1,
                "timestamp-ms": 1515100955770,  
                "summary": {    "operation": "append"  },  
                "manifest-list": "s3://b/wh/.../s1.avro",
                "schema-id": 0
            } 
        "#;

        let snapshot: SnapshotV2 = serde_json::from_str(&data).unwrap();
        assert_eq!(Some(Operation::Append), snapshot.summary.operation);
        assert!(snapshot.summary.other.is_empty());
    }

}
