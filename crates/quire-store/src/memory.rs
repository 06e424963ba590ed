use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::{StoreError, StoreResult};
use crate::traits::{join_public_url, BlobMeta, BlobStore, PutOutcome};

/// Default public base URL for in-memory stores.
pub const MEMORY_PUBLIC_BASE: &str = "memory://quire";

#[derive(Clone, Debug)]
struct Entry {
    data: Bytes,
    modified: DateTime<Utc>,
}

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. All blobs are held in memory behind a
/// `RwLock`; the lock is never held across an `.await`, so create-if-absent
/// is atomic with respect to every other call.
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<String, Entry>>,
    public_base: String,
    fail_deletes: AtomicBool,
    writes: AtomicU64,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_public_base(MEMORY_PUBLIC_BASE)
    }

    /// Create a new empty store whose public URLs start with `base`.
    pub fn with_public_base(base: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            public_base: base.into(),
            fail_deletes: AtomicBool::new(false),
            writes: AtomicU64::new(0),
        }
    }

    /// Make every subsequent `delete` fail (or succeed again).
    ///
    /// Used to exercise best-effort cleanup paths.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Shift a blob's modification time into the past.
    ///
    /// Returns `false` if the blob does not exist.
    pub fn backdate(&self, key: &str, by: Duration) -> bool {
        let Ok(mut map) = self.objects.write() else {
            return false;
        };
        match map.get_mut(key) {
            Some(entry) => {
                let by = chrono::Duration::from_std(by)
                    .unwrap_or_else(|_| chrono::Duration::weeks(52 * 100));
                entry.modified = entry
                    .modified
                    .checked_sub_signed(by)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                true
            }
            None => false,
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful writes (overwrites and creations) so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
        StoreError::Unavailable(format!("lock poisoned: {e}"))
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        let map = self.objects.read().map_err(Self::poisoned)?;
        Ok(map.get(key).map(|e| e.data.clone()))
    }

    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        validate_key(key)?;
        let mut map = self.objects.write().map_err(Self::poisoned)?;
        map.insert(
            key.to_string(),
            Entry {
                data,
                modified: Utc::now(),
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn put_if_absent(&self, key: &str, data: Bytes) -> StoreResult<PutOutcome> {
        validate_key(key)?;
        let mut map = self.objects.write().map_err(Self::poisoned)?;
        if map.contains_key(key) {
            return Ok(PutOutcome::AlreadyExists);
        }
        map.insert(
            key.to_string(),
            Entry {
                data,
                modified: Utc::now(),
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(PutOutcome::Created)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("delete of {key} rejected")));
        }
        let mut map = self.objects.write().map_err(Self::poisoned)?;
        Ok(map.remove(key).is_some())
    }

    async fn head(&self, key: &str) -> StoreResult<Option<BlobMeta>> {
        let map = self.objects.read().map_err(Self::poisoned)?;
        Ok(map.get(key).map(|e| BlobMeta {
            size: e.data.len() as u64,
            last_modified: e.modified,
        }))
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let map = self.objects.read().map_err(Self::poisoned)?;
        let mut keys: Vec<String> = map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url(&self.public_base, key)
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("object_count", &self.len())
            .field("public_base", &self.public_base)
            .finish()
    }
}

pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() || key.ends_with('/') {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must name an object".into(),
        });
    }
    Ok(())
}
