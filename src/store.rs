/*!
The relational metadata catalog: two tables, a foreign key, and a
transactional upsert-by-name [`MetadataStore::save`].
*/

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::catalog_model::{ColumnMetadata, TableFormat, TableMetadata};
use crate::config::StoreConfig;
use crate::error::{DiscoveryError, Result};

/// Persistent catalog of discovered tables, backed by SQLite.
///
/// Schema is designed for an easy future migration to Postgres: JSON-encoded
/// `partitions`/`properties` columns, integer surrogate keys, a
/// `column_metadata` child table with `ON DELETE CASCADE`.
pub struct MetadataStore {
    pool: SqlitePool,
}

impl MetadataStore {
    /// Opens (creating if necessary) the catalog at `database_url` and runs
    /// its schema migration.
    ///
    /// An in-memory `database_url` (`sqlite::memory:` or `sqlite://:memory:`)
    /// is private per-connection unless shared through a single connection,
    /// so the pool caps itself at one connection for those URLs rather than
    /// silently handing later queries an empty database.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);
        let max_connections = if is_in_memory_url(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;
        let store = MetadataStore { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// Opens the catalog backend named by `config`.
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::connect(&config.database_url).await
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS table_metadata (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                table_name TEXT NOT NULL UNIQUE,
                format TEXT NOT NULL,
                location TEXT NOT NULL,
                partitions TEXT,
                properties TEXT,
                supports_time_travel BOOLEAN NOT NULL DEFAULT 0,
                num_files INTEGER,
                size_bytes INTEGER,
                row_count INTEGER,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS column_metadata (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                table_id INTEGER NOT NULL,
                column_name TEXT NOT NULL,
                data_type TEXT NOT NULL,
                nullable BOOLEAN NOT NULL DEFAULT 1,
                comment TEXT,
                column_order INTEGER NOT NULL,
                FOREIGN KEY (table_id) REFERENCES table_metadata (id) ON DELETE CASCADE,
                UNIQUE(table_id, column_name)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

        for index in [
            "CREATE INDEX IF NOT EXISTS idx_table_name ON table_metadata(table_name)",
            "CREATE INDEX IF NOT EXISTS idx_format ON table_metadata(format)",
            "CREATE INDEX IF NOT EXISTS idx_table_id ON column_metadata(table_id)",
        ] {
            sqlx::query(index)
                .execute(&self.pool)
                .await
                .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;
        }
        Ok(())
    }

    /// Upserts `meta` by `table_name`. On conflict, updates the row and
    /// replaces its columns; `created_at` is preserved across updates.
    /// The whole operation is one transaction.
    pub async fn save(&self, meta: &TableMetadata) -> Result<i64> {
        debug!(table = %meta.table_name, "saving table metadata");
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

        let partitions_json = serde_json::to_string(&meta.partitions)
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;
        let properties_json = serde_json::to_string(&meta.properties)
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;
        let format = meta.format.to_string();

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM table_metadata WHERE table_name = ?",
        )
        .bind(&meta.table_name)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

        let table_id = if let Some(id) = existing {
            sqlx::query(
                r#"
                UPDATE table_metadata SET
                    format = ?, location = ?, partitions = ?, properties = ?,
                    supports_time_travel = ?, num_files = ?, size_bytes = ?,
                    row_count = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&format)
            .bind(&meta.location)
            .bind(&partitions_json)
            .bind(&properties_json)
            .bind(meta.supports_time_travel)
            .bind(meta.num_files.map(|v| v as i64))
            .bind(meta.size_bytes.map(|v| v as i64))
            .bind(meta.row_count.map(|v| v as i64))
            .bind(meta.updated_at)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

            sqlx::query("DELETE FROM column_metadata WHERE table_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

            id
        } else {
            let result = sqlx::query(
                r#"
                INSERT INTO table_metadata (
                    table_name, format, location, partitions, properties,
                    supports_time_travel, num_files, size_bytes, row_count,
                    created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&meta.table_name)
            .bind(&format)
            .bind(&meta.location)
            .bind(&partitions_json)
            .bind(&properties_json)
            .bind(meta.supports_time_travel)
            .bind(meta.num_files.map(|v| v as i64))
            .bind(meta.size_bytes.map(|v| v as i64))
            .bind(meta.row_count.map(|v| v as i64))
            .bind(meta.created_at)
            .bind(meta.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

            result.last_insert_rowid()
        };

        for (idx, column) in meta.columns.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO column_metadata (
                    table_id, column_name, data_type, nullable, comment, column_order
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(table_id)
            .bind(&column.name)
            .bind(&column.data_type)
            .bind(column.nullable)
            .bind(&column.comment)
            .bind(idx as i64)
            .execute(&mut *tx)
            .await
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

        info!(table = %meta.table_name, id = table_id, "saved table metadata");
        Ok(table_id)
    }

    /// Looks up a table's format without reconstructing the full record.
    /// Used by the engine to enforce format immutability before `save`.
    pub async fn format_of(&self, table_name: &str) -> Result<Option<TableFormat>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT format FROM table_metadata WHERE table_name = ?")
                .bind(table_name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;
        row.map(|(f,)| parse_format(&f)).transpose()
    }

    /// Fetches a table's full metadata, columns ordered by `column_order`.
    pub async fn get(&self, table_name: &str) -> Result<Option<TableMetadata>> {
        let row = sqlx::query(
            "SELECT id, format, location, partitions, properties, supports_time_travel, \
             num_files, size_bytes, row_count, created_at, updated_at \
             FROM table_metadata WHERE table_name = ?",
        )
        .bind(table_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: i64 = row.try_get("id").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?;
        let format: String = row.try_get("format").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?;
        let location: String = row.try_get("location").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?;
        let partitions_json: String = row.try_get("partitions").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?;
        let properties_json: String = row.try_get("properties").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?;
        let supports_time_travel: bool = row.try_get("supports_time_travel").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?;
        let num_files: Option<i64> = row.try_get("num_files").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?;
        let size_bytes: Option<i64> = row.try_get("size_bytes").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?;
        let row_count: Option<i64> = row.try_get("row_count").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?;

        let partitions: Vec<String> = serde_json::from_str(&partitions_json)
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;
        let properties: HashMap<String, String> = serde_json::from_str(&properties_json)
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

        let column_rows = sqlx::query(
            "SELECT column_name, data_type, nullable, comment FROM column_metadata \
             WHERE table_id = ? ORDER BY column_order",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

        let mut columns = Vec::with_capacity(column_rows.len());
        for (idx, r) in column_rows.iter().enumerate() {
            columns.push(ColumnMetadata {
                name: r.try_get("column_name").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?,
                data_type: r.try_get("data_type").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?,
                nullable: r.try_get("nullable").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?,
                ordinal_position: idx,
                comment: r.try_get("comment").map_err(|e| DiscoveryError::StorageBackend(e.to_string()))?,
            });
        }

        Ok(Some(TableMetadata {
            table_name: table_name.to_string(),
            format: parse_format(&format)?,
            location,
            columns,
            partitions,
            properties,
            supports_time_travel,
            num_files: num_files.map(|v| v as u64),
            size_bytes: size_bytes.map(|v| v as u64),
            row_count: row_count.map(|v| v as u64),
            created_at,
            updated_at,
        }))
    }

    /// Lists table names, optionally restricted to one format, name-sorted.
    pub async fn list(&self, format: Option<TableFormat>) -> Result<Vec<String>> {
        let rows = match format {
            Some(format) => {
                sqlx::query("SELECT table_name FROM table_metadata WHERE format = ? ORDER BY table_name")
                    .bind(format.to_string())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT table_name FROM table_metadata ORDER BY table_name")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;

        rows.iter()
            .map(|r| {
                r.try_get("table_name")
                    .map_err(|e| DiscoveryError::StorageBackend(e.to_string()))
            })
            .collect()
    }

    /// Deletes a table and (via `ON DELETE CASCADE`) its columns. Returns
    /// whether a row existed.
    pub async fn delete(&self, table_name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM table_metadata WHERE table_name = ?")
            .bind(table_name)
            .execute(&self.pool)
            .await
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Total number of tables in the store.
    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM table_metadata")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| DiscoveryError::StorageBackend(err.to_string()))?;
        Ok(count as u64)
    }
}

/// Whether `database_url` names a private, non-shared in-memory SQLite
/// database rather than a file on disk.
fn is_in_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") && !database_url.contains("cache=shared")
}

fn parse_format(s: &str) -> Result<TableFormat> {
    match s {
        "ICEBERG" => Ok(TableFormat::Iceberg),
        "DELTA" => Ok(TableFormat::Delta),
        "HUDI" => Ok(TableFormat::Hudi),
        "PARQUET" => Ok(TableFormat::Parquet),
        other => Err(DiscoveryError::StorageBackend(format!(
            "unrecognized stored format '{other}'"
        ))),
    }
}
