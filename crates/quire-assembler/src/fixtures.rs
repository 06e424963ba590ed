//! Synthetic PNG and JPEG images for tests, and a way to look inside the
//! pages built from them.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::Document;

/// Deterministic noise so encoders cannot shrink the fixture below the
/// minimum image size.
fn noise(x: u32, y: u32, salt: u32) -> u8 {
    let v = (x.wrapping_mul(31) ^ y.wrapping_mul(17) ^ salt).wrapping_mul(2_654_435_761);
    (v >> 24) as u8
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([noise(x, y, 1), noise(x, y, 2), noise(x, y, 3)])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

pub fn translucent_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([noise(x, y, 4), noise(x, y, 5), noise(x, y, 6), (x * 4) as u8])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([noise(x, y, 7), noise(x, y, 8), noise(x, y, 9)])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// Stored image stream and MediaBox of page `number` (1-based) of `pdf`.
pub fn page_image(pdf: &[u8], number: u32) -> (Vec<u8>, Vec<f32>) {
    let doc = Document::load_mem(pdf).unwrap();
    let page_id = doc.get_pages()[&number];
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let media_box = page
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o.as_float().unwrap())
        .collect();
    let xobjects = page
        .get(b"Resources")
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"XObject")
        .unwrap()
        .as_dict()
        .unwrap();
    let (_, image) = xobjects.iter().next().unwrap();
    let stream = doc
        .get_object(image.as_reference().unwrap())
        .unwrap()
        .as_stream()
        .unwrap();
    (stream.content.clone(), media_box)
}
