use thiserror::Error;

use crate::sniff::ImageFormat;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("image too small: {len} bytes, need at least {min}")]
    ImageTooSmall { len: usize, min: usize },

    #[error("failed to decode {format} image: {reason}")]
    Decode { format: ImageFormat, reason: String },

    #[error("unsupported image format")]
    UnsupportedImage,

    #[error("pdf error: {0}")]
    Codec(String),
}

impl From<lopdf::Error> for AssembleError {
    fn from(e: lopdf::Error) -> Self {
        AssembleError::Codec(e.to_string())
    }
}

pub type AssembleResult<T> = Result<T, AssembleError>;
