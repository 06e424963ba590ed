use quire_assembler::AssembleError;
use quire_lock::LockError;
use quire_refs::RefError;
use quire_store::StoreError;
use quire_types::TypeError;
use thiserror::Error;

/// Why an append did not complete.
#[derive(Debug, Error)]
pub enum AppendError {
    /// The request itself is malformed. Retrying cannot help.
    #[error("{0}")]
    InvalidRequest(String),

    #[error("timed out waiting for the lock on {doc} after {attempts} attempts")]
    LockTimeout { doc: String, attempts: u32 },

    /// The page image could not be fetched, or is too short to be real.
    #[error("image fetch failed: {0}")]
    ImageFetch(String),

    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("store error: {0}")]
    Store(String),

    /// A stored version is not a readable PDF, or a new one could not be
    /// written out.
    #[error("document codec error: {0}")]
    Codec(String),
}

impl AppendError {
    /// Whether the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppendError::LockTimeout { .. } | AppendError::ImageFetch(_) | AppendError::Store(_)
        )
    }

    /// Whether the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppendError::InvalidRequest(_))
    }
}

impl From<TypeError> for AppendError {
    fn from(e: TypeError) -> Self {
        AppendError::InvalidRequest(e.to_string())
    }
}

impl From<StoreError> for AppendError {
    fn from(e: StoreError) -> Self {
        AppendError::Store(e.to_string())
    }
}

impl From<RefError> for AppendError {
    fn from(e: RefError) -> Self {
        match e {
            RefError::Store(e) => e.into(),
            RefError::Serialization(msg) => AppendError::Store(msg),
        }
    }
}

impl From<LockError> for AppendError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::Timeout { doc, attempts } => AppendError::LockTimeout { doc, attempts },
            LockError::Store(e) => e.into(),
        }
    }
}

impl From<AssembleError> for AppendError {
    fn from(e: AssembleError) -> Self {
        match e {
            AssembleError::ImageTooSmall { .. } => AppendError::ImageFetch(e.to_string()),
            AssembleError::Decode { .. } | AssembleError::UnsupportedImage => {
                AppendError::Decode(e.to_string())
            }
            AssembleError::Codec(msg) => AppendError::Codec(msg),
        }
    }
}

pub type AppendResult<T> = Result<T, AppendError>;
