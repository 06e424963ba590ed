use std::sync::Arc;

use bytes::Bytes;
use quire_assembler::Assembler;
use quire_lock::{LockManager, LockPolicy, LockStatus};
use quire_refs::{next_version_key, ManifestStore, PointerStore};
use quire_store::BlobStore;
use quire_types::{DocumentId, DocumentLayout, VersionKey};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::{AppendError, AppendResult};
use crate::request::{AppendOutcome, AppendRequest, AppendStage, CurrentVersion};
use crate::source::ImageSource;

/// Fresh version names tried past an occupied one before giving up.
const MAX_VERSION_NAMES: u32 = 16;

/// Appends pages to documents, one locked read-modify-publish cycle per page.
///
/// Every append of a page already recorded in the document's manifest is a
/// no-op that reports the current version. Versions are never overwritten:
/// each successful append publishes a new version and then moves the
/// pointer to it.
#[derive(Clone)]
pub struct Appender {
    store: Arc<dyn BlobStore>,
    images: Arc<dyn ImageSource>,
    layout: DocumentLayout,
    locks: LockManager,
    pointers: PointerStore,
    manifests: ManifestStore,
    assembler: Assembler,
}

impl Appender {
    pub fn new(
        store: Arc<dyn BlobStore>,
        images: Arc<dyn ImageSource>,
        layout: DocumentLayout,
        policy: LockPolicy,
        assembler: Assembler,
    ) -> Self {
        Self {
            locks: LockManager::new(store.clone(), layout.clone(), policy),
            pointers: PointerStore::new(store.clone(), layout.clone()),
            manifests: ManifestStore::new(store.clone(), layout.clone()),
            store,
            images,
            layout,
            assembler,
        }
    }

    pub fn layout(&self) -> &DocumentLayout {
        &self.layout
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Public URL of a version.
    pub fn url_of(&self, key: &VersionKey) -> String {
        self.store.public_url(&self.layout.version_path(key))
    }

    /// Append `req.page` to `req.doc` unless it is already there.
    pub async fn append(&self, req: &AppendRequest) -> AppendResult<AppendOutcome> {
        let span = info_span!(
            "append",
            role = %req.doc.role,
            job_id = %req.doc.job_id,
            page_key = %req.page,
        );
        async {
            let mut stage = AppendStage::Idle;
            let result = self.run(req, &mut stage).await;
            if let Err(e) = &result {
                warn!(%stage, error = %e, retryable = e.is_retryable(), "append failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    /// The latest version of `doc`, if it has one.
    pub async fn current(&self, doc: &DocumentId) -> AppendResult<Option<CurrentVersion>> {
        let Some(version_key) = self.pointers.read(doc).await? else {
            return Ok(None);
        };
        let manifest = self.manifests.load(doc).await?;
        Ok(Some(CurrentVersion {
            url: self.url_of(&version_key),
            version_key,
            pages: manifest.pages().map(str::to_string).collect(),
        }))
    }

    /// Delete the lock marker of `doc` regardless of who holds it.
    ///
    /// Only for clearing a marker left behind by a crashed writer.
    pub async fn force_unlock(&self, doc: &DocumentId) -> AppendResult<bool> {
        Ok(self.locks.force_release(doc).await?)
    }

    /// The lock on `doc`, if one is held.
    pub async fn lock_status(&self, doc: &DocumentId) -> AppendResult<Option<LockStatus>> {
        Ok(self.locks.status(doc).await?)
    }

    async fn run(
        &self,
        req: &AppendRequest,
        stage: &mut AppendStage,
    ) -> AppendResult<AppendOutcome> {
        advance(stage, AppendStage::LockWait);
        let guard = self.locks.acquire(&req.doc).await?;
        let result = self.locked(req, stage).await;
        guard.release().await;
        result
    }

    async fn locked(
        &self,
        req: &AppendRequest,
        stage: &mut AppendStage,
    ) -> AppendResult<AppendOutcome> {
        let doc = &req.doc;

        advance(stage, AppendStage::ManifestCheck);
        let mut manifest = self.manifests.load(doc).await?;
        let current = self.pointers.read(doc).await?;
        if manifest.contains(&req.page) {
            match &current {
                Some(version_key) => {
                    info!(version = %version_key, "page already appended");
                    advance(stage, AppendStage::Done);
                    return Ok(AppendOutcome {
                        url: self.url_of(version_key),
                        version_key: version_key.clone(),
                        appended: false,
                        page_count: None,
                    });
                }
                None => warn!("manifest records page but no version is published, rebuilding"),
            }
        }

        advance(stage, AppendStage::Assemble);
        let previous = match &current {
            Some(key) => {
                let bytes = self.store.get(&self.layout.version_path(key)).await?;
                if bytes.is_none() {
                    warn!(version = %key, "pointer names a missing version, starting fresh");
                }
                bytes
            }
            None => None,
        };
        let image = self.images.fetch(&req.image_path).await?;
        let (format, page_count, encoded) = {
            let mut pdf = self
                .assembler
                .load_or_create(previous.as_deref(), &req.meta)?;
            let format = self
                .assembler
                .append_image_page(&mut pdf, doc.role, &image.bytes)?;
            let encoded = self.assembler.serialize(&mut pdf)?;
            (format, pdf.page_count(), Bytes::from(encoded))
        };

        advance(stage, AppendStage::PersistVersion);
        let version_key = self
            .persist_version(doc, current.as_ref(), encoded)
            .await?;

        advance(stage, AppendStage::UpdateManifest);
        manifest.mark(&req.page);
        self.manifests.save(doc, &manifest).await?;

        advance(stage, AppendStage::UpdatePointer);
        self.pointers.write(doc, &version_key).await?;

        advance(stage, AppendStage::Done);
        info!(version = %version_key, pages = page_count, %format, "page appended");
        Ok(AppendOutcome {
            url: self.url_of(&version_key),
            version_key,
            appended: true,
            page_count: Some(page_count),
        })
    }

    /// Write `bytes` as the version after `current`.
    ///
    /// A name that is already taken belongs to a version published by a
    /// writer that died before moving the pointer; it is skipped, not
    /// overwritten.
    async fn persist_version(
        &self,
        doc: &DocumentId,
        current: Option<&VersionKey>,
        bytes: Bytes,
    ) -> AppendResult<VersionKey> {
        let mut key = next_version_key(current, doc);
        for _ in 0..MAX_VERSION_NAMES {
            let path = self.layout.version_path(&key);
            if self.store.put_if_absent(&path, bytes.clone()).await?.is_created() {
                return Ok(key);
            }
            warn!(version = %key, "version name already taken, skipping");
            key = next_version_key(Some(&key), doc);
        }
        Err(AppendError::Store(format!(
            "no free version name for {doc} after {MAX_VERSION_NAMES} attempts"
        )))
    }
}

fn advance(stage: &mut AppendStage, next: AppendStage) {
    debug!(from = %stage, to = %next, "append stage");
    *stage = next;
}
