//! Shared fixture builders for the end-to-end scenarios in `discovery.rs`.

use std::sync::Arc;

use lakehouse_discovery::object_store::ObjectStoreExt;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::ObjectStore as UpstreamStore;

/// A fresh in-memory object store, returned both as the upstream type (so
/// callers can `put` fixture bytes) and adapted to `ObjectStoreExt` (so
/// callers can hand it to a [`lakehouse_discovery::DiscoveryEngine`]).
pub fn new_store() -> (Arc<dyn UpstreamStore>, Arc<dyn ObjectStoreExt>) {
    let upstream: Arc<dyn UpstreamStore> = Arc::new(InMemory::new());
    let ext: Arc<dyn ObjectStoreExt> = Arc::new(upstream.clone());
    (upstream, ext)
}

pub async fn put(store: &Arc<dyn UpstreamStore>, key: &str, body: &str) {
    store
        .put(&Path::from(key), body.to_string().into())
        .await
        .unwrap();
}

pub fn iceberg_metadata_json() -> &'static str {
    r#"{
        "format-version": 2,
        "location": "s3://bucket/wh/orders",
        "last-updated-ms": 1000,
        "current-schema-id": 0,
        "schemas": [{
            "schema-id": 0,
            "type": "struct",
            "fields": [
                {"id": 1, "name": "order_id", "required": true, "type": "long"},
                {"id": 5, "name": "region", "required": false, "type": "string"}
            ]
        }],
        "default-spec-id": 0,
        "partition-specs": [{
            "spec-id": 0,
            "fields": [
                {"source-id": 5, "field-id": 1000, "name": "region", "transform": "identity"}
            ]
        }],
        "properties": {"owner": "data-eng"},
        "current-snapshot-id": 10,
        "snapshots": [{
            "snapshot-id": 10,
            "sequence-number": 1,
            "timestamp-ms": 1000,
            "manifest-list": "s3://bucket/wh/orders/metadata/snap-10.avro",
            "summary": {"operation": "append"}
        }]
    }"#
}

pub fn delta_log_json() -> &'static str {
    r#"{"metaData":{"id":"t1","name":"events","schemaString":"{\"fields\":[{\"name\":\"id\",\"type\":\"long\",\"nullable\":false,\"metadata\":{}},{\"name\":\"dt\",\"type\":\"date\",\"nullable\":true,\"metadata\":{}}]}","partitionColumns":["dt"],"configuration":{},"createdTime":1}}"#
}

pub fn truncated_delta_log_json() -> &'static str {
    r#"{"metaData":{"id":"t1","name":"events","schemaString":"#
}

pub fn hoodie_properties(table_name: &str) -> String {
    format!(
        "hoodie.table.name={table_name}\nhoodie.table.type=COPY_ON_WRITE\nhoodie.table.partition.fields=region\n"
    )
}

pub fn hudi_commit_json() -> &'static str {
    r#"{"metadata":{"schema":"{\"type\":\"record\",\"name\":\"sales_hudi_record\",\"fields\":[{\"name\":\"order_id\",\"type\":\"long\"},{\"name\":\"region\",\"type\":[\"null\",\"string\"],\"default\":null}]}"}}"#
}

/// A minimal single-row-group Parquet file: `user_id` (required INT64),
/// `country` (optional UTF8 BYTE_ARRAY), three rows with one null country.
pub fn parquet_fixture_bytes() -> Vec<u8> {
    use parquet::data_type::{ByteArray, ByteArrayType, Int64Type};
    use parquet::file::properties::WriterProperties;
    use parquet::file::writer::SerializedFileWriter;
    use parquet::schema::parser::parse_message_type;

    let message_type = "
        message schema {
            REQUIRED INT64 user_id;
            OPTIONAL BYTE_ARRAY country (UTF8);
        }
    ";
    let schema = Arc::new(parse_message_type(message_type).unwrap());
    let props = Arc::new(WriterProperties::builder().build());

    let mut buf = Vec::new();
    {
        let mut writer = SerializedFileWriter::new(&mut buf, schema, props).unwrap();
        let mut row_group_writer = writer.next_row_group().unwrap();

        let mut col_writer = row_group_writer.next_column().unwrap().unwrap();
        col_writer
            .typed::<Int64Type>()
            .write_batch(&[1_i64, 2, 3], None, None)
            .unwrap();
        col_writer.close().unwrap();

        let mut col_writer = row_group_writer.next_column().unwrap().unwrap();
        let values = vec![ByteArray::from("US"), ByteArray::from("CA")];
        col_writer
            .typed::<ByteArrayType>()
            .write_batch(&values, Some(&[1, 1, 0]), None)
            .unwrap();
        col_writer.close().unwrap();

        row_group_writer.close().unwrap();
        writer.close().unwrap();
    }
    buf
}
