//! The per-document idempotency manifest.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use quire_store::BlobStore;
use quire_types::{DocumentId, DocumentLayout, PageKey};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RefError, Result};

/// Which page keys have already produced a version of a document.
///
/// Stored as a JSON object mapping page key to `true`. Entries are only ever
/// added; an entry that is present but `false` counts as not recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, bool>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `page` has been appended.
    pub fn contains(&self, page: &PageKey) -> bool {
        self.0.get(page.as_str()).copied().unwrap_or(false)
    }

    /// Record `page` as appended. Returns `false` if it already was.
    pub fn mark(&mut self, page: &PageKey) -> bool {
        let previous = self.0.insert(page.as_str().to_string(), true);
        previous != Some(true)
    }

    /// Number of recorded pages.
    pub fn len(&self) -> usize {
        self.0.values().filter(|v| **v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recorded page keys, in key order.
    pub fn pages(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, appended)| **appended)
            .map(|(k, _)| k.as_str())
    }
}

/// Loads and saves the manifest object of each document.
#[derive(Clone)]
pub struct ManifestStore {
    store: Arc<dyn BlobStore>,
    layout: DocumentLayout,
}

impl ManifestStore {
    pub fn new(store: Arc<dyn BlobStore>, layout: DocumentLayout) -> Self {
        Self { store, layout }
    }

    /// Load the manifest of `doc`.
    ///
    /// A missing or unparsable manifest loads as empty; only store failures
    /// are errors.
    pub async fn load(&self, doc: &DocumentId) -> Result<Manifest> {
        let path = self.layout.manifest_path(doc);
        let Some(data) = self.store.get(&path).await? else {
            return Ok(Manifest::new());
        };
        match serde_json::from_slice::<Manifest>(&data) {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                warn!(%doc, error = %e, "unreadable manifest, treating as empty");
                Ok(Manifest::new())
            }
        }
    }

    /// Overwrite the manifest of `doc`.
    pub async fn save(&self, doc: &DocumentId, manifest: &Manifest) -> Result<()> {
        let path = self.layout.manifest_path(doc);
        let data =
            serde_json::to_vec(manifest).map_err(|e| RefError::Serialization(e.to_string()))?;
        self.store.put(&path, Bytes::from(data)).await?;
        Ok(())
    }
}
