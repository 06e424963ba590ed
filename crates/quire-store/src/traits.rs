use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;

/// Result of a create-if-absent write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    /// This caller's write created the object.
    Created,
    /// An object already existed under the key; nothing was written.
    AlreadyExists,
}

impl PutOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, PutOutcome::Created)
    }
}

/// Metadata for a stored blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobMeta {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// A flat, eventually-consistent blob namespace.
///
/// All implementations must satisfy these invariants:
/// - `put_if_absent` is atomic per key: of any set of concurrent calls for
///   the same absent key, exactly one observes [`PutOutcome::Created`].
/// - Reads of a missing key return `Ok(None)`, not an error.
/// - The store never interprets object contents.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a blob. Returns `Ok(None)` if it does not exist.
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Write a blob, replacing any existing object under `key`.
    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()>;

    /// Write a blob only if no object exists under `key`.
    async fn put_if_absent(&self, key: &str, data: Bytes) -> StoreResult<PutOutcome>;

    /// Delete a blob. Returns `true` if the object existed.
    ///
    /// Backends that cannot tell whether the object existed report `true`.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Size and modification time of a blob, if it exists.
    async fn head(&self, key: &str) -> StoreResult<Option<BlobMeta>>;

    /// All keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// The URL a reader outside this process uses to fetch `key`.
    ///
    /// Such reads may be served from a cache that ignores overwrites.
    fn public_url(&self, key: &str) -> String;

    /// Check whether a blob exists.
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.head(key).await?.is_some())
    }
}

/// Join a public base URL and an object key.
pub(crate) fn join_public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}
