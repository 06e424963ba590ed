use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("could not acquire lock for {doc} after {attempts} attempts")]
    Timeout { doc: String, attempts: u32 },

    #[error("store error: {0}")]
    Store(#[from] quire_store::StoreError),
}

pub type LockResult<T> = Result<T, LockError>;
