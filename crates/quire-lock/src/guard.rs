use std::sync::Arc;

use quire_store::BlobStore;
use tracing::{debug, warn};

/// Proof that the caller holds a document's lock.
///
/// Call [`release`](LockGuard::release) when the critical section ends. A
/// guard dropped without being released (panic, cancelled future) schedules
/// the release on the current tokio runtime instead.
#[must_use = "dropping a LockGuard releases the lock in the background"]
pub struct LockGuard {
    store: Arc<dyn BlobStore>,
    path: String,
    released: bool,
}

impl LockGuard {
    pub(crate) fn new(store: Arc<dyn BlobStore>, path: String) -> Self {
        Self {
            store,
            path,
            released: false,
        }
    }

    /// Key of the marker object this guard holds.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Release the lock now. Failures are logged, never returned.
    pub async fn release(mut self) {
        self.released = true;
        release_marker(self.store.as_ref(), &self.path).await;
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let store = self.store.clone();
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(lock = %path, "lock guard dropped while held, releasing in background");
                handle.spawn(async move {
                    release_marker(store.as_ref(), &path).await;
                });
            }
            Err(_) => {
                warn!(lock = %path, "lock guard dropped outside a runtime, marker left in place");
            }
        }
    }
}

/// Delete a lock marker, logging instead of failing.
pub(crate) async fn release_marker(store: &dyn BlobStore, path: &str) {
    match store.delete(path).await {
        Ok(true) => debug!(lock = %path, "lock released"),
        Ok(false) => warn!(lock = %path, "lock marker already gone at release"),
        Err(e) => warn!(lock = %path, error = %e, "failed to release lock"),
    }
}
