use serde::{Deserialize, Serialize};

use crate::document::DocumentId;
use crate::version::VersionKey;

/// Object key layout for documents and their bookkeeping objects.
///
/// Every object for a document lives directly under `root` in a flat
/// namespace:
///
/// | Object   | Key                                   |
/// |----------|---------------------------------------|
/// | Version  | `{root}/{role}_{jobId}__v{N}.pdf`     |
/// | Pointer  | `{root}/{role}_{jobId}.latest`        |
/// | Manifest | `{root}/{role}_{jobId}.manifest.json` |
/// | Lock     | `{root}/{role}_{jobId}.lock`          |
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLayout {
    root: String,
}

impl DocumentLayout {
    pub fn new(root: impl Into<String>) -> Self {
        let root: String = root.into();
        Self {
            root: root.trim_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn version_path(&self, key: &VersionKey) -> String {
        self.join(key.as_str())
    }

    pub fn pointer_path(&self, doc: &DocumentId) -> String {
        self.join(&format!("{}.latest", doc.stem()))
    }

    pub fn manifest_path(&self, doc: &DocumentId) -> String {
        self.join(&format!("{}.manifest.json", doc.stem()))
    }

    pub fn lock_path(&self, doc: &DocumentId) -> String {
        self.join(&format!("{}.lock", doc.stem()))
    }

    /// Prefix shared by every version of `doc`, for listing.
    pub fn versions_prefix(&self, doc: &DocumentId) -> String {
        self.join(&format!("{}__v", doc.stem()))
    }

    fn join(&self, name: &str) -> String {
        if self.root.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.root, name)
        }
    }
}

impl Default for DocumentLayout {
    fn default() -> Self {
        Self::new("pdfs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentRole, JobId};

    fn doc() -> DocumentId {
        DocumentId::new(DocumentRole::Customer, JobId::new("J1").unwrap())
    }

    #[test]
    fn default_layout_paths() {
        let layout = DocumentLayout::default();
        let doc = doc();
        assert_eq!(
            layout.version_path(&VersionKey::for_document(&doc, 2)),
            "pdfs/customer_J1__v2.pdf"
        );
        assert_eq!(layout.pointer_path(&doc), "pdfs/customer_J1.latest");
        assert_eq!(layout.manifest_path(&doc), "pdfs/customer_J1.manifest.json");
        assert_eq!(layout.lock_path(&doc), "pdfs/customer_J1.lock");
        assert_eq!(layout.versions_prefix(&doc), "pdfs/customer_J1__v");
    }

    #[test]
    fn root_slashes_are_trimmed() {
        let layout = DocumentLayout::new("/books/");
        assert_eq!(layout.root(), "books");
        assert_eq!(layout.lock_path(&doc()), "books/customer_J1.lock");
    }

    #[test]
    fn empty_root() {
        let layout = DocumentLayout::new("");
        assert_eq!(layout.lock_path(&doc()), "customer_J1.lock");
    }
}
