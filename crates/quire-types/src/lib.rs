//! Foundation types for quire.
//!
//! This crate provides the identity and naming types shared by every other
//! quire crate. Nothing here performs I/O.
//!
//! # Key Types
//!
//! - [`DocumentRole`] — which rendition of a job's book is being assembled
//! - [`JobId`] — validated storefront job identifier
//! - [`DocumentId`] — a logical document: `(role, job_id)`
//! - [`PageKey`] — caller-chosen logical page name (e.g. `storyPage3`)
//! - [`VersionKey`] — name of one immutable document version
//! - [`DocumentLayout`] — where versions, pointers, manifests and locks live

pub mod document;
pub mod error;
pub mod layout;
pub mod names;
pub mod page;
pub mod version;

pub use document::{DocumentId, DocumentRole, JobId};
pub use error::TypeError;
pub use layout::DocumentLayout;
pub use page::PageKey;
pub use version::{VersionKey, DOCUMENT_EXTENSION};
