use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3ConfigKey;
use object_store::path::Path;
use object_store::{ObjectStore, PutMode, PutPayload};
use tracing::debug;
use url::Url;

use crate::error::{StoreError, StoreResult};
use crate::memory::validate_key;
use crate::traits::{join_public_url, BlobMeta, BlobStore, PutOutcome};

/// [`BlobStore`] backed by any `object_store` implementation.
///
/// Keys are resolved relative to `prefix`. Create-if-absent maps to
/// `PutMode::Create`, which local disk, in-memory and S3 backends implement
/// natively.
#[derive(Clone)]
pub struct ObjectBlobStore {
    inner: Arc<dyn ObjectStore>,
    prefix: Path,
    public_base: String,
}

impl ObjectBlobStore {
    pub fn new(inner: Arc<dyn ObjectStore>, prefix: Path, public_base: impl Into<String>) -> Self {
        Self {
            inner,
            prefix,
            public_base: public_base.into(),
        }
    }

    /// Build a store from a URL such as `file:///var/lib/quire`,
    /// `memory:///` or `s3://bucket/prefix`.
    ///
    /// S3 credentials and region come from the usual `AWS_*` environment
    /// variables.
    pub fn from_url(url: &str, public_base: impl Into<String>) -> StoreResult<Self> {
        let parsed =
            Url::parse(url).map_err(|e| StoreError::Config(format!("invalid store url {url}: {e}")))?;
        // Prefer explicit AWS_* keys over instance metadata credentials.
        let opts: Vec<(AmazonS3ConfigKey, String)> = std::env::vars()
            .filter(|(k, _)| k.starts_with("AWS_"))
            .filter_map(|(k, v)| Some((k.to_ascii_lowercase().parse().ok()?, v)))
            .collect();
        let (store, prefix) = object_store::parse_url_opts(&parsed, opts)?;
        debug!(url, prefix = %prefix, "opened object store");
        Ok(Self::new(Arc::from(store), prefix, public_base))
    }

    fn location(&self, key: &str) -> Path {
        let prefix = self.prefix.as_ref();
        if prefix.is_empty() {
            Path::from(key)
        } else {
            Path::from(format!("{prefix}/{key}"))
        }
    }

    fn key_of(&self, location: &Path) -> String {
        let full = location.as_ref();
        let prefix = self.prefix.as_ref();
        if prefix.is_empty() {
            return full.to_string();
        }
        full.strip_prefix(prefix)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(full)
            .to_string()
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        match self.inner.get(&self.location(key)).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        validate_key(key)?;
        self.inner
            .put(&self.location(key), PutPayload::from(data))
            .await?;
        Ok(())
    }

    async fn put_if_absent(&self, key: &str, data: Bytes) -> StoreResult<PutOutcome> {
        validate_key(key)?;
        let result = self
            .inner
            .put_opts(
                &self.location(key),
                PutPayload::from(data),
                PutMode::Create.into(),
            )
            .await;
        match result {
            Ok(_) => Ok(PutOutcome::Created),
            Err(object_store::Error::AlreadyExists { .. })
            | Err(object_store::Error::Precondition { .. }) => Ok(PutOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        match self.inner.delete(&self.location(key)).await {
            Ok(()) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn head(&self, key: &str) -> StoreResult<Option<BlobMeta>> {
        match self.inner.head(&self.location(key)).await {
            Ok(meta) => Ok(Some(BlobMeta {
                size: meta.size as u64,
                last_modified: meta.last_modified,
            })),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        // object_store lists by path segment, so list the enclosing
        // directory and filter on the partial final segment.
        let dir = match prefix.rsplit_once('/') {
            Some((dir, _)) => self.location(dir),
            None => self.prefix.clone(),
        };
        let metas: Vec<_> = self.inner.list(Some(&dir)).try_collect().await?;
        let mut keys: Vec<String> = metas
            .iter()
            .map(|m| self.key_of(&m.location))
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url(&self.public_base, key)
    }
}

impl std::fmt::Debug for ObjectBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBlobStore")
            .field("backend", &self.inner.to_string())
            .field("prefix", &self.prefix.as_ref())
            .field("public_base", &self.public_base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use object_store::local::LocalFileSystem;
    use object_store::memory::InMemory;

    use super::*;

    fn local_store(dir: &tempfile::TempDir) -> ObjectBlobStore {
        let fs = LocalFileSystem::new_with_prefix(dir.path()).unwrap();
        ObjectBlobStore::new(Arc::new(fs), Path::default(), "https://cdn.test/s")
    }

    #[tokio::test]
    async fn local_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir);

        assert_eq!(store.get("pdfs/a.pdf").await.unwrap(), None);
        store
            .put("pdfs/a.pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap();
        assert_eq!(
            store.get("pdfs/a.pdf").await.unwrap(),
            Some(Bytes::from_static(b"%PDF"))
        );
        assert_eq!(store.head("pdfs/a.pdf").await.unwrap().unwrap().size, 4);
        assert!(store.delete("pdfs/a.pdf").await.unwrap());
        assert!(!store.delete("pdfs/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn local_create_if_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir);

        let first = store
            .put_if_absent("pdfs/x.lock", Bytes::from_static(b"1"))
            .await
            .unwrap();
        let second = store
            .put_if_absent("pdfs/x.lock", Bytes::from_static(b"1"))
            .await
            .unwrap();
        assert_eq!(first, PutOutcome::Created);
        assert_eq!(second, PutOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn list_filters_partial_segment() {
        let store = ObjectBlobStore::new(
            Arc::new(InMemory::new()),
            Path::from("root"),
            "memory://quire",
        );
        for key in ["pdfs/c_J1__v1.pdf", "pdfs/c_J1__v2.pdf", "pdfs/c_J2__v1.pdf"] {
            store.put(key, Bytes::from_static(b".")).await.unwrap();
        }
        assert_eq!(
            store.list("pdfs/c_J1__v").await.unwrap(),
            vec!["pdfs/c_J1__v1.pdf".to_string(), "pdfs/c_J1__v2.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn from_memory_url() {
        let store = ObjectBlobStore::from_url("memory:///", "memory://quire").unwrap();
        store.put("k", Bytes::from_static(b"v")).await.unwrap();
        assert!(store.exists("k").await.unwrap());
        assert_eq!(store.public_url("k"), "memory://quire/k");
    }

    #[test]
    fn rejects_bad_url() {
        assert!(ObjectBlobStore::from_url("not a url", "x").is_err());
    }
}
