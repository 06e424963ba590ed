/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key cannot be used as an object name.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// The store could not be constructed from its configuration.
    #[error("store configuration error: {0}")]
    Config(String),

    /// Error reported by the underlying `object_store` backend.
    #[error("object store error: {0}")]
    Backend(#[from] object_store::Error),

    /// Failure injected or raised by an in-process backend.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
