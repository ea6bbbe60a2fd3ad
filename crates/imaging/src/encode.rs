//! Output encoding.

use crate::error::{ImagingError, ImagingResult};
use bytes::Bytes;
use cachecow_core::config::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Encode `img` in `format`. `jpeg_quality` is only read for JPEG.
pub(crate) fn encode(img: &DynamicImage, format: OutputFormat, jpeg_quality: u8) -> ImagingResult<Bytes> {
    let mut out = Cursor::new(Vec::new());
    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut out, jpeg_quality.clamp(1, 100))
                .encode_image(&rgb)
                .map_err(|e| ImagingError::Encode(e.to_string()))?;
        }
        OutputFormat::Png => {
            img.write_to(&mut out, ImageFormat::Png)
                .map_err(|e| ImagingError::Encode(e.to_string()))?;
        }
        OutputFormat::Webp => {
            // The WebP encoder only accepts 8-bit RGB(A).
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut out, ImageFormat::WebP)
                .map_err(|e| ImagingError::Encode(e.to_string()))?;
        }
    }
    Ok(Bytes::from(out.into_inner()))
}
