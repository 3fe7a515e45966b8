/*!
The storage capability the core consumes: `list`, `get`, `head`.

A real deployment hands the engine an already-credentialed
`Arc<dyn object_store::ObjectStore>` (S3, GCS, local disk, ...); the core
never resolves credentials itself. [`ObjectStoreExt`] adapts that crate's
trait to the narrower, synchronous-from-the-engine's-perspective contract
spec'd in §4.1, translating its error variants into [`DiscoveryError`].
*/

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::{path::Path, ObjectStore as UpstreamStore};

use crate::error::{DiscoveryError, Result};

/// A single entry returned by [`list`](ObjectStoreExt::list) or
/// [`head`](ObjectStoreExt::head).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Full key, relative to the store's root.
    pub key: String,
    /// Size in bytes.
    pub size: usize,
    /// Last-modified timestamp, when the backend reports one.
    pub last_modified: DateTime<Utc>,
}

/// Extension trait adapting any `object_store::ObjectStore` to the contract
/// the detector and readers need.
#[async_trait::async_trait]
pub trait ObjectStoreExt: Send + Sync {
    /// Lists up to `max_keys` objects under `prefix`.
    async fn list(&self, prefix: &str, max_keys: usize) -> Result<Vec<ObjectInfo>>;

    /// Fetches the full contents of `key`.
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Fetches metadata for `key` without downloading its contents.
    async fn head(&self, key: &str) -> Result<ObjectInfo>;
}

#[async_trait::async_trait]
impl<T> ObjectStoreExt for T
where
    T: UpstreamStore,
{
    async fn list(&self, prefix: &str, max_keys: usize) -> Result<Vec<ObjectInfo>> {
        let path = Path::from(prefix);
        let stream = UpstreamStore::list(self, Some(&path))
            .await
            .map_err(|err| map_store_error(prefix, err))?;
        let metas: Vec<_> = stream
            .take(max_keys)
            .try_collect()
            .await
            .map_err(|err| map_store_error(prefix, err))?;
        Ok(metas
            .into_iter()
            .map(|m| ObjectInfo {
                key: m.location.to_string(),
                size: m.size,
                last_modified: m.last_modified,
            })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let path = Path::from(key);
        let result = UpstreamStore::get(self, &path)
            .await
            .map_err(|err| map_store_error(key, err))?;
        result
            .bytes()
            .await
            .map_err(|err| map_store_error(key, err))
    }

    async fn head(&self, key: &str) -> Result<ObjectInfo> {
        let path = Path::from(key);
        let meta = UpstreamStore::head(self, &path)
            .await
            .map_err(|err| map_store_error(key, err))?;
        Ok(ObjectInfo {
            key: meta.location.to_string(),
            size: meta.size,
            last_modified: meta.last_modified,
        })
    }
}

fn map_store_error(uri: &str, err: object_store::Error) -> DiscoveryError {
    match err {
        object_store::Error::NotFound { .. } => DiscoveryError::DetectionNotFound {
            uri: uri.to_string(),
            cause: err.to_string(),
        },
        object_store::Error::PermissionDenied { .. } | object_store::Error::Unauthenticated { .. } => {
            DiscoveryError::DetectionAccessDenied {
                uri: uri.to_string(),
                cause: err.to_string(),
            }
        }
        other => DiscoveryError::ReadTransport {
            cause: other.to_string(),
        },
    }
}
