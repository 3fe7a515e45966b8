/*!
On-disk JSON model for Apache Iceberg table metadata.

These types describe exactly the shape of the files under a table's
`metadata/` directory. They exist only to be deserialized by
[`crate::readers::iceberg::IcebergReader`] and handed to
[`crate::normalizer`] as `Raw::Iceberg`; nothing here is persisted.
*/

pub mod metadata;
pub mod partition;
pub mod schema;
pub mod snapshot;
