//! Error types for pointer and manifest operations.

use thiserror::Error;

/// Errors that can occur while reading or writing document bookkeeping.
#[derive(Debug, Error)]
pub enum RefError {
    /// The underlying blob store failed.
    #[error("store error: {0}")]
    Store(#[from] quire_store::StoreError),

    /// A record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
