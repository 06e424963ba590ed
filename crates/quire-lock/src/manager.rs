use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use quire_store::BlobStore;
use quire_types::{DocumentId, DocumentLayout};
use tracing::{debug, warn};

use crate::error::{LockError, LockResult};
use crate::guard::{release_marker, LockGuard};
use crate::policy::LockPolicy;

/// Content of a lock marker. Only the marker's existence matters.
const LOCK_MARKER: &[u8] = b"1";

/// A held lock as seen from outside.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockStatus {
    /// When the marker was written.
    pub since: DateTime<Utc>,
    pub age: Duration,
}

/// Hands out per-document advisory locks.
#[derive(Clone)]
pub struct LockManager {
    store: Arc<dyn BlobStore>,
    layout: DocumentLayout,
    policy: LockPolicy,
}

impl LockManager {
    pub fn new(store: Arc<dyn BlobStore>, layout: DocumentLayout, policy: LockPolicy) -> Self {
        Self {
            store,
            layout,
            policy,
        }
    }

    pub fn policy(&self) -> &LockPolicy {
        &self.policy
    }

    /// Try once to take the lock for `doc`.
    ///
    /// Returns `true` only if this call created the marker.
    pub async fn try_acquire(&self, doc: &DocumentId) -> LockResult<bool> {
        let path = self.layout.lock_path(doc);
        let outcome = self
            .store
            .put_if_absent(&path, Bytes::from_static(LOCK_MARKER))
            .await?;
        Ok(outcome.is_created())
    }

    /// Release the lock for `doc`. Failures are logged, never returned.
    pub async fn release(&self, doc: &DocumentId) {
        release_marker(self.store.as_ref(), &self.layout.lock_path(doc)).await;
    }

    /// Take the lock for `doc`, polling with backoff.
    ///
    /// Fails with [`LockError::Timeout`] once `max_attempts` attempts have
    /// lost. Store failures are returned immediately. A marker is never
    /// removed here, however old: only its holder or an operator deletes it.
    pub async fn acquire(&self, doc: &DocumentId) -> LockResult<LockGuard> {
        let path = self.layout.lock_path(doc);
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 0..attempts {
            if self.try_acquire(doc).await? {
                debug!(%doc, attempt, "lock acquired");
                return Ok(LockGuard::new(self.store.clone(), path));
            }

            if attempt + 1 < attempts {
                let delay = self.policy.delay(attempt, &mut rand::thread_rng());
                debug!(%doc, attempt, delay_ms = delay.as_millis() as u64, "lock busy, backing off");
                tokio::time::sleep(delay).await;
            }
        }

        match self.status(doc).await {
            Ok(Some(status)) => warn!(
                %doc,
                attempts,
                held_for_secs = status.age.as_secs(),
                "gave up waiting for lock"
            ),
            _ => warn!(%doc, attempts, "gave up waiting for lock"),
        }
        Err(LockError::Timeout {
            doc: doc.to_string(),
            attempts,
        })
    }

    /// Run `f` while holding the lock for `doc`.
    ///
    /// `f` is only invoked after the lock is acquired. The lock is released
    /// after `f` completes, whether it returned `Ok` or `Err`, and before its
    /// result is handed back.
    pub async fn with_lock<F, Fut, T, E>(&self, doc: &DocumentId, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        let guard = self.acquire(doc).await?;
        let result = f().await;
        guard.release().await;
        result
    }

    /// Whether `doc` is locked, and for how long.
    pub async fn status(&self, doc: &DocumentId) -> LockResult<Option<LockStatus>> {
        let path = self.layout.lock_path(doc);
        let Some(meta) = self.store.head(&path).await? else {
            return Ok(None);
        };
        let age = (Utc::now() - meta.last_modified).to_std().unwrap_or_default();
        Ok(Some(LockStatus {
            since: meta.last_modified,
            age,
        }))
    }

    /// Delete the marker for `doc` regardless of who holds it.
    ///
    /// Returns `true` if a marker existed. Only safe once the holder is
    /// known to be gone.
    pub async fn force_release(&self, doc: &DocumentId) -> LockResult<bool> {
        let path = self.layout.lock_path(doc);
        let existed = self.store.delete(&path).await?;
        warn!(%doc, existed, "lock marker removed by operator");
        Ok(existed)
    }
}
