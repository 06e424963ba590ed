//! The current-version pointer and version naming.

use std::sync::Arc;

use bytes::Bytes;
use quire_store::BlobStore;
use quire_types::{DocumentId, DocumentLayout, VersionKey};
use tracing::debug;

use crate::error::Result;

/// Name of the version that follows `prev`.
///
/// - No previous version: version 1.
/// - Previous key ends in `__v<N>`: version `N + 1`.
/// - Previous key is malformed: treated as version 1, so the result is
///   version 2.
///
/// # Examples
///
/// ```
/// use quire_refs::next_version_key;
/// use quire_types::{DocumentId, DocumentRole, JobId, VersionKey};
///
/// let doc = DocumentId::new(DocumentRole::Customer, JobId::new("J1").unwrap());
/// assert_eq!(next_version_key(None, &doc).as_str(), "customer_J1__v1.pdf");
///
/// let v1 = VersionKey::for_document(&doc, 1);
/// assert_eq!(next_version_key(Some(&v1), &doc).as_str(), "customer_J1__v2.pdf");
/// ```
pub fn next_version_key(prev: Option<&VersionKey>, doc: &DocumentId) -> VersionKey {
    let next = match prev {
        None => 1,
        Some(key) => key.number().unwrap_or(1).saturating_add(1),
    };
    VersionKey::for_document(doc, next)
}

/// Reads and writes the per-document pointer object.
///
/// The pointer holds the current [`VersionKey`] as plain text. A missing or
/// empty pointer means the document has no version yet.
#[derive(Clone)]
pub struct PointerStore {
    store: Arc<dyn BlobStore>,
    layout: DocumentLayout,
}

impl PointerStore {
    pub fn new(store: Arc<dyn BlobStore>, layout: DocumentLayout) -> Self {
        Self { store, layout }
    }

    /// The current version of `doc`, if any.
    pub async fn read(&self, doc: &DocumentId) -> Result<Option<VersionKey>> {
        let path = self.layout.pointer_path(doc);
        let Some(data) = self.store.get(&path).await? else {
            return Ok(None);
        };
        let text = String::from_utf8_lossy(&data);
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(VersionKey::from_raw(text)))
    }

    /// Point `doc` at `key`, replacing any previous value.
    pub async fn write(&self, doc: &DocumentId, key: &VersionKey) -> Result<()> {
        let path = self.layout.pointer_path(doc);
        self.store
            .put(&path, Bytes::from(key.as_str().to_owned()))
            .await?;
        debug!(%doc, version = %key, "pointer updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use quire_store::InMemoryBlobStore;
    use quire_types::{DocumentRole, JobId};

    fn doc() -> DocumentId {
        DocumentId::new(DocumentRole::Customer, JobId::new("J1").unwrap())
    }

    fn pointers() -> (Arc<InMemoryBlobStore>, PointerStore) {
        let store = Arc::new(InMemoryBlobStore::new());
        let pointers = PointerStore::new(store.clone(), DocumentLayout::default());
        (store, pointers)
    }

    #[test]
    fn first_version_is_one() {
        assert_eq!(next_version_key(None, &doc()).as_str(), "customer_J1__v1.pdf");
    }

    #[test]
    fn increments_parsed_suffix() {
        let prev = VersionKey::from_raw("customer_J1__v41.pdf");
        assert_eq!(
            next_version_key(Some(&prev), &doc()).as_str(),
            "customer_J1__v42.pdf"
        );
    }

    #[test]
    fn malformed_previous_falls_back_to_two() {
        for raw in ["customer_J1.pdf", "garbage", "customer_J1__vX.pdf", ""] {
            let prev = VersionKey::from_raw(raw);
            assert_eq!(
                next_version_key(Some(&prev), &doc()).as_str(),
                "customer_J1__v2.pdf",
                "prev = {raw:?}"
            );
        }
    }

    proptest! {
        #[test]
        fn chain_is_strictly_increasing(steps in 1usize..64) {
            let doc = doc();
            let mut prev: Option<VersionKey> = None;
            let mut seen = std::collections::HashSet::new();
            for _ in 0..steps {
                let next = next_version_key(prev.as_ref(), &doc);
                if let Some(p) = &prev {
                    prop_assert!(next.number().unwrap() > p.number().unwrap());
                }
                prop_assert!(seen.insert(next.clone()));
                prev = Some(next);
            }
        }

        #[test]
        fn next_always_exceeds_valid_previous(n in 1u64..u64::MAX) {
            let doc = doc();
            let prev = VersionKey::for_document(&doc, n);
            prop_assert_eq!(next_version_key(Some(&prev), &doc).number(), Some(n + 1));
        }
    }

    #[tokio::test]
    async fn missing_pointer_is_none() {
        let (_, pointers) = pointers();
        assert_eq!(pointers.read(&doc()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_pointer_is_none() {
        let (store, pointers) = pointers();
        store
            .put("pdfs/customer_J1.latest", Bytes::from_static(b"  \n"))
            .await
            .unwrap();
        assert_eq!(pointers.read(&doc()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_then_read_trims() {
        let (store, pointers) = pointers();
        let key = VersionKey::for_document(&doc(), 3);
        pointers.write(&doc(), &key).await.unwrap();
        assert_eq!(pointers.read(&doc()).await.unwrap(), Some(key.clone()));

        store
            .put(
                "pdfs/customer_J1.latest",
                Bytes::from_static(b"customer_J1__v3.pdf\n"),
            )
            .await
            .unwrap();
        assert_eq!(pointers.read(&doc()).await.unwrap(), Some(key));
    }
}
