//! Mutable bookkeeping objects for quire documents.
//!
//! Versions are immutable and uniquely named. The only objects this crate
//! overwrites are the two small per-document records that tie the version
//! chain together:
//!
//! - The **pointer** names the current version. Because every version gets a
//!   brand-new name, a reader that follows the pointer always misses any
//!   cache that still holds an older document.
//! - The **manifest** records which page keys already produced a version, so
//!   repeated appends of the same page are no-ops.
//!
//! Both are only written by the holder of the document's lock.
//!
//! # Modules
//!
//! - [`error`] — Error types for pointer and manifest operations
//! - [`pointer`] — [`PointerStore`] and [`next_version_key`]
//! - [`manifest`] — [`Manifest`] and [`ManifestStore`]

pub mod error;
pub mod manifest;
pub mod pointer;

pub use error::{RefError, Result};
pub use manifest::{Manifest, ManifestStore};
pub use pointer::{next_version_key, PointerStore};
