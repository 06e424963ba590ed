use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{ColorType, DynamicImage, GenericImageView};

use crate::error::{AssembleError, AssembleResult};
use crate::sniff::{jpeg_components, sniff, ImageFormat};

/// Pixel data ready to become a PDF image XObject.
#[derive(Debug)]
pub(crate) struct EmbeddedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub filter: &'static str,
    pub data: Vec<u8>,
    /// Flate-compressed 8-bit alpha plane, present only when some pixel is
    /// not fully opaque.
    pub alpha: Option<Vec<u8>>,
}

/// Sniff and decode `bytes`.
///
/// A recognized signature commits to that format and a failure is
/// [`AssembleError::Decode`]. Unrecognized bytes are tried as JPEG, then as
/// PNG, and fail with [`AssembleError::UnsupportedImage`].
pub(crate) fn prepare(bytes: &[u8]) -> AssembleResult<EmbeddedImage> {
    if let Some(format) = sniff(bytes) {
        return decode_as(bytes, format);
    }
    decode_as(bytes, ImageFormat::Jpeg)
        .or_else(|_| decode_as(bytes, ImageFormat::Png))
        .map_err(|_| AssembleError::UnsupportedImage)
}

fn decode_as(bytes: &[u8], format: ImageFormat) -> AssembleResult<EmbeddedImage> {
    let decoded = image::load_from_memory_with_format(bytes, format.to_image_format()).map_err(
        |e| AssembleError::Decode {
            format,
            reason: e.to_string(),
        },
    )?;
    match format {
        ImageFormat::Jpeg if is_cmyk_jpeg(bytes) => flatten_to_rgb(&decoded, format),
        ImageFormat::Jpeg => Ok(passthrough_jpeg(bytes, &decoded)),
        ImageFormat::Png => flatten_to_rgb(&decoded, format),
    }
}

/// Four-component JPEGs are re-encoded: passed through they would need
/// `DeviceCMYK` plus a guess at Adobe's inverted encoding.
fn is_cmyk_jpeg(bytes: &[u8]) -> bool {
    jpeg_components(bytes) == Some(4)
}

/// JPEG goes in untouched; PDF readers decode DCT natively.
fn passthrough_jpeg(bytes: &[u8], decoded: &DynamicImage) -> EmbeddedImage {
    let (width, height) = decoded.dimensions();
    let color_space = match decoded.color() {
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => "DeviceGray",
        _ => "DeviceRGB",
    };
    EmbeddedImage {
        format: ImageFormat::Jpeg,
        width,
        height,
        color_space,
        filter: "DCTDecode",
        data: bytes.to_vec(),
        alpha: None,
    }
}

fn flatten_to_rgb(decoded: &DynamicImage, format: ImageFormat) -> AssembleResult<EmbeddedImage> {
    let (width, height) = decoded.dimensions();
    let rgba = decoded.to_rgba8();
    let pixels = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixels * 3);
    let mut alpha = Vec::with_capacity(pixels);
    let mut translucent = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        translucent |= a != u8::MAX;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let alpha = if translucent {
        Some(flate_compress(&alpha)?)
    } else {
        None
    };
    Ok(EmbeddedImage {
        format,
        width,
        height,
        color_space: "DeviceRGB",
        filter: "FlateDecode",
        data: flate_compress(&rgb)?,
        alpha,
    })
}

fn flate_compress(data: &[u8]) -> AssembleResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let codec = |e: std::io::Error| AssembleError::Codec(format!("flate compression failed: {e}"));
    encoder.write_all(data).map_err(codec)?;
    encoder.finish().map_err(codec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn jpeg_is_passed_through() {
        let bytes = fixtures::jpeg(64, 48);
        let img = prepare(&bytes).unwrap();
        assert_eq!(img.format, ImageFormat::Jpeg);
        assert_eq!((img.width, img.height), (64, 48));
        assert_eq!(img.filter, "DCTDecode");
        assert_eq!(img.color_space, "DeviceRGB");
        assert_eq!(img.data, bytes);
        assert!(img.alpha.is_none());
    }

    #[test]
    fn only_four_component_jpegs_are_reencoded() {
        assert!(!is_cmyk_jpeg(&fixtures::jpeg(32, 32)));
        let mut header = vec![
            0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x14, 0x08, 0x00, 0x10, 0x00, 0x10, 0x04,
        ];
        assert!(is_cmyk_jpeg(&header));
        header[11] = 3;
        assert!(!is_cmyk_jpeg(&header));
    }

    #[test]
    fn reencoded_jpeg_is_flate_rgb() {
        let bytes = fixtures::jpeg(40, 24);
        let decoded =
            image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg).unwrap();
        let img = flatten_to_rgb(&decoded, ImageFormat::Jpeg).unwrap();
        assert_eq!(img.format, ImageFormat::Jpeg);
        assert_eq!((img.width, img.height), (40, 24));
        assert_eq!(img.filter, "FlateDecode");
        assert_eq!(img.color_space, "DeviceRGB");
        assert!(img.alpha.is_none());
    }

    #[test]
    fn opaque_png_has_no_mask() {
        let img = prepare(&fixtures::png(40, 30)).unwrap();
        assert_eq!(img.format, ImageFormat::Png);
        assert_eq!((img.width, img.height), (40, 30));
        assert_eq!(img.filter, "FlateDecode");
        assert!(img.alpha.is_none());
    }

    #[test]
    fn translucent_png_gets_mask() {
        let img = prepare(&fixtures::translucent_png(40, 30)).unwrap();
        assert!(img.alpha.is_some());
    }

    #[test]
    fn jpeg_with_trailing_bytes_falls_back() {
        let mut bytes = fixtures::jpeg(32, 32);
        bytes.extend_from_slice(&[0, 0, 0]);
        assert!(sniff(&bytes).is_none());
        let img = prepare(&bytes).unwrap();
        assert_eq!(img.format, ImageFormat::Jpeg);
    }

    #[test]
    fn png_with_broken_body_is_decode_error() {
        let mut bytes = fixtures::png(32, 32);
        bytes.truncate(64);
        assert!(matches!(
            prepare(&bytes),
            Err(AssembleError::Decode {
                format: ImageFormat::Png,
                ..
            })
        ));
    }

    #[test]
    fn garbage_is_unsupported() {
        let bytes = vec![0x42u8; 4096];
        assert!(matches!(prepare(&bytes), Err(AssembleError::UnsupportedImage)));
    }
}
