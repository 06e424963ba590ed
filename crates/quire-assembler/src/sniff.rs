use std::fmt;

use serde::{Deserialize, Serialize};

const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Raster formats that can become a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identify `bytes` by their signature.
///
/// PNG needs the 4-byte magic. JPEG needs both the start-of-image marker at
/// the front and the end-of-image marker at the back. Anything else is
/// `None`, and the caller falls back to trial decoding.
///
/// ```
/// use quire_assembler::{sniff, ImageFormat};
///
/// assert_eq!(sniff(&[0x89, b'P', b'N', b'G', 0x0D]), Some(ImageFormat::Png));
/// assert_eq!(sniff(&[0xFF, 0xD8, 0x00, 0xFF, 0xD9]), Some(ImageFormat::Jpeg));
/// assert_eq!(sniff(b"GIF89a"), None);
/// ```
pub fn sniff(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(&PNG_MAGIC) {
        return Some(ImageFormat::Png);
    }
    if bytes.len() >= 4 && bytes.starts_with(&JPEG_SOI) && bytes.ends_with(&JPEG_EOI) {
        return Some(ImageFormat::Jpeg);
    }
    None
}

/// Number of color components declared in a JPEG's frame header: 1 for
/// grayscale, 3 for YCbCr/RGB, 4 for CMYK/YCCK.
///
/// Walks the marker segments up to the first start-of-frame. Returns `None`
/// if the bytes end or go astray before one is found.
pub fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if !bytes.starts_with(&JPEG_SOI) {
        return None;
    }
    let mut i = JPEG_SOI.len();
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        if marker == 0xFF {
            // Fill byte before a marker.
            i += 1;
            continue;
        }
        // SOF0..SOF15, except DHT, JPG and DAC which share the range.
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            // FF Cn, length(2), precision(1), height(2), width(2), Nf(1)
            return bytes.get(i + 9).copied();
        }
        if marker == 0xDA {
            return None;
        }
        let len = usize::from(u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]));
        if len < 2 {
            return None;
        }
        i += 2 + len;
    }
    None
}
