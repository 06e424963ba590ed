//! Advisory per-document locks for quire.
//!
//! A lock is a one-byte marker object next to the document's other objects.
//! Whoever creates the marker with a create-if-absent write holds the lock;
//! deleting the marker releases it. Contenders poll with exponential backoff
//! plus jitter rather than waiting on a wakeup.
//!
//! The lock is advisory: it only excludes writers that also go through a
//! [`LockManager`].
//!
//! # Failure behavior
//!
//! - Release is best-effort. A failed delete is logged and ignored, which
//!   leaves the marker in place until it is removed out of band with
//!   [`LockManager::force_release`] (`quire unlock`). Contenders never
//!   remove a marker themselves, whatever its age: the store has no
//!   conditional delete, so a contender could not be sure it removes the
//!   marker it inspected.
//! - A [`LockGuard`] dropped without an explicit release (panic, dropped
//!   future) schedules the release on the current tokio runtime.

pub mod error;
pub mod guard;
pub mod manager;
pub mod policy;

pub use error::{LockError, LockResult};
pub use guard::LockGuard;
pub use manager::{LockManager, LockStatus};
pub use policy::LockPolicy;
