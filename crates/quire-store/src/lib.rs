//! Blob storage for quire.
//!
//! The store is a flat namespace of named binary blobs with get, put, delete
//! and list, plus one conditional primitive: create-if-absent. There are no
//! transactions and no compare-and-swap on existing objects. Reads through a
//! [`public_url`](BlobStore::public_url) may be served by a cache that does
//! not observe overwrites; only new names are guaranteed to be fresh.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`ObjectBlobStore`] -- any `object_store` backend (local disk, memory, S3)
//!
//! # Design Rules
//!
//! 1. `put_if_absent` has at most one winner per key.
//! 2. A missing object is `None` / `false`, never an error.
//! 3. The store never interprets object contents.

pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryBlobStore;
pub use object::ObjectBlobStore;
pub use traits::{BlobMeta, BlobStore, PutOutcome};
