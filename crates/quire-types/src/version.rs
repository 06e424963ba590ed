use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::DocumentId;

/// File extension of every stored version.
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// Separator between a document stem and its version number.
const VERSION_MARKER: &str = "__v";

/// Name of one immutable document version, relative to the documents root:
/// `{role}_{jobId}__v{N}.pdf`.
///
/// `VersionKey` is deliberately lenient: whatever text a pointer object holds
/// is wrapped as-is, and [`number`](VersionKey::number) reports `None` when
/// the text does not end in a version suffix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionKey(String);

impl VersionKey {
    /// Wrap raw text (e.g. the trimmed content of a pointer object).
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The key of version `n` of `doc`.
    pub fn for_document(doc: &DocumentId, n: u64) -> Self {
        Self(format!(
            "{}{VERSION_MARKER}{n}.{DOCUMENT_EXTENSION}",
            doc.stem()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The version number parsed from the trailing `__v<N>` suffix.
    ///
    /// Returns `None` if the suffix is missing, not all digits, zero, or does
    /// not fit in a `u64`.
    pub fn number(&self) -> Option<u64> {
        let name = self
            .0
            .strip_suffix(DOCUMENT_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(&self.0);
        let (_, digits) = name.rsplit_once(VERSION_MARKER)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u64>().ok().filter(|n| *n >= 1)
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
