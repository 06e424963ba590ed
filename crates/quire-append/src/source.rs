use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use quire_store::BlobStore;

use crate::error::{AppendError, AppendResult};

/// Raw bytes of one page image.
#[derive(Clone, Debug)]
pub struct FetchedImage {
    pub bytes: Bytes,
    /// MIME type hint. The assembler sniffs the bytes regardless.
    pub content_type: Option<&'static str>,
}

/// Where page images come from.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the image at `path`. Any failure is [`AppendError::ImageFetch`].
    async fn fetch(&self, path: &str) -> AppendResult<FetchedImage>;
}

/// Reads page images from a [`BlobStore`] under a fixed root.
#[derive(Clone)]
pub struct StoreImageSource {
    store: Arc<dyn BlobStore>,
    root: String,
}

impl StoreImageSource {
    pub fn new(store: Arc<dyn BlobStore>, root: impl Into<String>) -> Self {
        let root: String = root.into();
        Self {
            store,
            root: root.trim_matches('/').to_string(),
        }
    }

    /// Full object key for an image path.
    pub fn key_for(&self, path: &str) -> String {
        if self.root.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.root, path)
        }
    }
}

#[async_trait]
impl ImageSource for StoreImageSource {
    async fn fetch(&self, path: &str) -> AppendResult<FetchedImage> {
        let key = self.key_for(path);
        let bytes = self
            .store
            .get(&key)
            .await
            .map_err(|e| AppendError::ImageFetch(format!("{key}: {e}")))?
            .ok_or_else(|| AppendError::ImageFetch(format!("{key}: not found")))?;
        Ok(FetchedImage {
            bytes,
            content_type: content_type_for(path),
        })
    }
}

/// MIME type implied by a path's extension.
pub fn content_type_for(path: &str) -> Option<&'static str> {
    let (_, ext) = path.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}
