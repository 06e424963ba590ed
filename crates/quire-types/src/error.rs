use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid job id {value:?}: {reason}")]
    InvalidJobId { value: String, reason: String },

    #[error("invalid page key {value:?}: {reason}")]
    InvalidPageKey { value: String, reason: String },

    #[error("unknown document role: {0}")]
    UnknownRole(String),
}
