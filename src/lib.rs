#![deny(missing_docs)]
/*!
# lakehouse-discovery

Format-neutral metadata discovery for Apache Iceberg, Delta Lake, Apache
Hudi and plain Parquet tables sitting in object storage.

Given a storage prefix, [`engine::DiscoveryEngine::discover`] classifies
which table format is present, reads that format's native metadata, folds
it into the canonical [`catalog_model::TableMetadata`], and persists it to
a relational catalog. Everything downstream of the normalizer is
format-neutral; readers and their on-disk shapes never leak past it.

```text
ObjectStore -> FormatDetector -> {Iceberg,Delta,Hudi,Parquet}Reader -> normalizer -> MetadataStore
```

This crate reads metadata only. It does not execute queries, write table
data, or reconcile cross-format semantics — see each module's
documentation for what it covers.
*/

pub mod catalog_model;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod model;
pub mod normalizer;
pub mod object_store;
pub mod readers;
pub mod store;

pub use catalog_model::{ColumnMetadata, TableFormat, TableMetadata};
pub use engine::DiscoveryEngine;
pub use error::{Diagnostic, DiscoveryError, Result};
pub use object_store::ObjectStoreExt;
