//! Page appends for quire documents.
//!
//! [`Appender::append`] adds one page image to one logical document under
//! the document's lock:
//!
//! 1. Wait for the lock.
//! 2. If the manifest already records the page, return the current version.
//! 3. Load the current version (or start empty), fetch the image, add a page.
//! 4. Publish the result under a new version name.
//! 5. Record the page in the manifest, then move the pointer.
//!
//! A crash between steps leaves every published version intact. Retrying
//! the same request is always safe.

pub mod appender;
pub mod error;
pub mod request;
pub mod source;

pub use appender::Appender;
pub use error::{AppendError, AppendResult};
pub use request::{
    normalize_image_path, AppendOutcome, AppendRequest, AppendStage, CurrentVersion,
    INVALID_IMAGE_PATH,
};
pub use source::{content_type_for, FetchedImage, ImageSource, StoreImageSource};

pub use quire_assembler::DocumentMeta;
pub use quire_lock::LockStatus;
pub use quire_types::{DocumentId, DocumentRole, JobId, PageKey, VersionKey};
