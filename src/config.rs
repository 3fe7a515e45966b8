/*!
Typed configuration for a [`crate::engine::DiscoveryEngine`].

The core has no CLI or HTTP surface of its own, but a host still needs a
documented, typed way to point the engine at a catalog backend rather than
threading a bare connection string through call sites. [`EngineConfig`]
is consumed by [`crate::engine::DiscoveryEngine::from_config`] and
[`crate::store::MetadataStore::from_config`].
*/

use serde::Deserialize;

use crate::error::{DiscoveryError, Result};

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Catalog backend configuration.
    pub store: StoreConfig,
}

/// Configuration for the relational metadata catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// A `sqlx` connection URL, e.g. `sqlite://catalog.db` or `sqlite::memory:`.
    pub database_url: String,
}

impl EngineConfig {
    /// Parses configuration from a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| DiscoveryError::StorageBackend(err.to_string()))
    }

    /// An in-memory SQLite configuration, useful for tests and one-off runs.
    pub fn in_memory() -> Self {
        EngineConfig {
            store: StoreConfig {
                database_url: "sqlite::memory:".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_database_url_from_toml() {
        let cfg = EngineConfig::from_toml(
            r#"
            [store]
            database_url = "sqlite://catalog.db"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.store.database_url, "sqlite://catalog.db");
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(EngineConfig::from_toml("not = [valid").is_err());
    }
}
