use std::fmt;

use quire_assembler::DocumentMeta;
use quire_types::{DocumentId, PageKey, VersionKey};
use serde::Serialize;

use crate::error::{AppendError, AppendResult};

/// Message returned for any image path that cannot be safely resolved.
pub const INVALID_IMAGE_PATH: &str = "Invalid image path";

/// One page to append to one document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppendRequest {
    pub doc: DocumentId,
    pub page: PageKey,
    /// Path of the page image, relative to the image root.
    pub image_path: String,
    /// Applied only when this append creates the document.
    pub meta: DocumentMeta,
}

impl AppendRequest {
    pub fn new(doc: DocumentId, page: PageKey, image_path: impl Into<String>) -> Self {
        Self {
            doc,
            page,
            image_path: image_path.into(),
            meta: DocumentMeta::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.meta.author = Some(author.into());
        self
    }
}

/// Result of a successful append.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendOutcome {
    /// The version that holds the page.
    pub version_key: VersionKey,
    /// Public URL of `version_key`.
    pub url: String,
    /// `false` when the page was already recorded and nothing was written.
    pub appended: bool,
    /// Pages in the new version. `None` when nothing was appended.
    pub page_count: Option<usize>,
}

/// What a reader needs to fetch the latest version of a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentVersion {
    pub version_key: VersionKey,
    pub url: String,
    /// Page keys recorded in the manifest, sorted.
    pub pages: Vec<String>,
}

/// Where an append is. Logged on every transition and on failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendStage {
    Idle,
    LockWait,
    ManifestCheck,
    Assemble,
    PersistVersion,
    UpdateManifest,
    UpdatePointer,
    Done,
}

impl AppendStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppendStage::Idle => "idle",
            AppendStage::LockWait => "lock_wait",
            AppendStage::ManifestCheck => "manifest_check",
            AppendStage::Assemble => "assemble",
            AppendStage::PersistVersion => "persist_version",
            AppendStage::UpdateManifest => "update_manifest",
            AppendStage::UpdatePointer => "update_pointer",
            AppendStage::Done => "done",
        }
    }
}

impl fmt::Display for AppendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turn a caller-supplied image location into a path under the image root.
///
/// `raw` may be a bare path or a full URL beginning with one of `prefixes`,
/// which is stripped. The result must be non-empty, must not start with `/`
/// and must not contain `..`. A URL under any other prefix is rejected.
///
/// ```
/// use quire_append::normalize_image_path;
///
/// let prefixes = vec!["https://cdn.example.com/images/".to_string()];
/// assert_eq!(
///     normalize_image_path("https://cdn.example.com/images/j1/p1.png", &prefixes).unwrap(),
///     "j1/p1.png"
/// );
/// assert!(normalize_image_path("../secrets", &prefixes).is_err());
/// ```
pub fn normalize_image_path(raw: &str, prefixes: &[String]) -> AppendResult<String> {
    let raw = raw.trim();
    let stripped = prefixes
        .iter()
        .filter(|p| !p.is_empty())
        .find_map(|p| raw.strip_prefix(p.as_str()))
        .unwrap_or(raw);
    if stripped.is_empty()
        || stripped.starts_with('/')
        || stripped.contains("..")
        || stripped.contains("://")
    {
        return Err(AppendError::InvalidRequest(INVALID_IMAGE_PATH.to_string()));
    }
    Ok(stripped.to_string())
}
