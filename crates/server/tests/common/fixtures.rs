//! Test images and credentials.

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Token configured for every test server.
#[allow(dead_code)]
pub const TEST_TOKEN: &str = "test-token";

/// Header value carrying the test token.
#[allow(dead_code)]
pub fn credential() -> String {
    format!(r#"{{"token":"{TEST_TOKEN}"}}"#)
}

/// A gradient PNG of the given size.
#[allow(dead_code)]
pub fn png_image(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode test PNG");
    Bytes::from(out.into_inner())
}

/// Dimensions of an encoded image.
#[allow(dead_code)]
pub fn image_dimensions(data: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(data).expect("Failed to decode image");
    (img.width(), img.height())
}
