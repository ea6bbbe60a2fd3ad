//! Solid-colour stand-in for a missing original.

use crate::encode::encode;
use crate::error::ImagingResult;
use crate::resize::TransformedImage;
use cachecow_core::config::{OutputFormat, PlaceholderConfig};
use image::{DynamicImage, Rgb, RgbImage};

/// Generate the placeholder image. The result is never cached.
pub fn generate_placeholder(
    config: &PlaceholderConfig,
    format: OutputFormat,
    jpeg_quality: u8,
) -> ImagingResult<TransformedImage> {
    let img = RgbImage::from_pixel(config.width, config.height, Rgb(config.color));
    let data = encode(&DynamicImage::ImageRgb8(img), format, jpeg_quality)?;
    Ok(TransformedImage {
        data,
        content_type: format.content_type(),
        width: config.width,
        height: config.height,
    })
}
