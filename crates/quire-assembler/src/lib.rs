//! PDF assembly for quire.
//!
//! An [`Assembler`] turns the bytes of the previous document version (or
//! nothing, for the first page) plus one raster image into the next version:
//! the old pages unchanged and one new page showing the image edge to edge.
//!
//! # Image handling
//!
//! - PNG is decoded, flattened to RGB and Flate-compressed. Non-opaque images
//!   get an 8-bit soft mask.
//! - JPEG is embedded byte-for-byte with the `DCTDecode` filter, except
//!   four-component (CMYK) JPEGs, which are re-encoded like PNG.
//! - Unrecognized bytes are tried as JPEG, then as PNG.
//!
//! The assembler performs no I/O. Callers fetch and store bytes.

pub mod config;
pub mod document;
mod embed;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod sniff;

pub use config::{AssemblerConfig, PageSize, PageSizes, DEFAULT_MIN_IMAGE_BYTES};
pub use document::{Assembler, DocumentMeta, PdfDocument};
pub use error::{AssembleError, AssembleResult};
pub use sniff::{sniff, ImageFormat};
