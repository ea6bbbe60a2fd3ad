//! Resizing of source images to an operation set.

use crate::encode::encode;
use crate::error::{ImagingError, ImagingResult};
use bytes::Bytes;
use cachecow_core::OperationSet;
use cachecow_core::config::{OutputFormat, TransformConfig};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// Encoded output of a transform.
#[derive(Clone, Debug)]
pub struct TransformedImage {
    pub data: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Black-box resampler: bytes plus target dimensions in, encoded bytes out.
///
/// Implementations are synchronous and CPU-bound; async callers should run them
/// on a blocking thread.
pub trait ImageTransformer: Send + Sync + 'static {
    /// Resize `source` according to `operations` and encode the result.
    fn transform(&self, source: &[u8], operations: &OperationSet) -> ImagingResult<TransformedImage>;

    /// MIME type of every image this transformer emits.
    fn content_type(&self) -> &'static str;
}

/// [`ImageTransformer`] backed by the `image` crate.
#[derive(Clone, Debug)]
pub struct ImageResizer {
    format: OutputFormat,
    jpeg_quality: u8,
    max_dimension: u32,
    filter: FilterType,
}

impl ImageResizer {
    pub fn new(format: OutputFormat, jpeg_quality: u8, max_dimension: u32) -> Self {
        Self {
            format,
            jpeg_quality,
            max_dimension,
            filter: FilterType::Lanczos3,
        }
    }

    pub fn from_config(config: &TransformConfig) -> Self {
        Self::new(
            config.output_format,
            config.jpeg_quality,
            config.max_dimension,
        )
    }

    fn check_dimension(&self, name: &str, value: Option<u32>) -> ImagingResult<()> {
        match value {
            Some(v) if v > self.max_dimension => Err(ImagingError::InvalidDimensions(format!(
                "{name} {v} exceeds maximum {}",
                self.max_dimension
            ))),
            _ => Ok(()),
        }
    }

    fn decode(source: &[u8]) -> ImagingResult<DynamicImage> {
        if source.is_empty() {
            return Err(ImagingError::Decode("source is empty".to_string()));
        }
        ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| ImagingError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| ImagingError::Decode(e.to_string()))
    }

    /// Apply the resize. A single dimension keeps the aspect ratio; both
    /// dimensions scale to cover the box and centre-crop the overflow.
    ///
    /// The side derived from the aspect ratio is bounded by `max_dimension` too.
    fn resize(&self, img: DynamicImage, operations: &OperationSet) -> ImagingResult<DynamicImage> {
        let (src_w, src_h) = (img.width(), img.height());
        let resized = match (operations.width(), operations.height()) {
            (Some(w), Some(h)) => img.resize_to_fill(w, h, self.filter),
            (Some(w), None) => {
                let h = scaled(src_h, w, src_w);
                self.check_dimension("derived height", Some(h))?;
                img.resize_exact(w, h, self.filter)
            }
            (None, Some(h)) => {
                let w = scaled(src_w, h, src_h);
                self.check_dimension("derived width", Some(w))?;
                img.resize_exact(w, h, self.filter)
            }
            (None, None) => img,
        };
        Ok(resized)
    }
}

/// `side * num / den`, rounded, at least 1.
fn scaled(side: u32, num: u32, den: u32) -> u32 {
    if den == 0 {
        return 1;
    }
    let value = (u64::from(side) * u64::from(num) + u64::from(den) / 2) / u64::from(den);
    value.clamp(1, u64::from(u32::MAX)) as u32
}

impl ImageTransformer for ImageResizer {
    fn transform(&self, source: &[u8], operations: &OperationSet) -> ImagingResult<TransformedImage> {
        self.check_dimension("width", operations.width())?;
        self.check_dimension("height", operations.height())?;

        let img = Self::decode(source)?;
        let resized = self.resize(img, operations)?;
        let data = encode(&resized, self.format, self.jpeg_quality)?;

        tracing::debug!(
            operations = %operations,
            width = resized.width(),
            height = resized.height(),
            bytes = data.len(),
            "Image transformed"
        );

        Ok(TransformedImage {
            data,
            content_type: self.format.content_type(),
            width: resized.width(),
            height: resized.height(),
        })
    }

    fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 0]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn dims(data: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(data).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_width_only_keeps_aspect_ratio() {
        let resizer = ImageResizer::new(OutputFormat::Png, 80, 4096);
        let out = resizer
            .transform(&png(200, 100), &OperationSet::new(Some(50), None))
            .unwrap();
        assert_eq!((out.width, out.height), (50, 25));
        assert_eq!(dims(&out.data), (50, 25));
    }

    #[test]
    fn test_height_only_keeps_aspect_ratio() {
        let resizer = ImageResizer::new(OutputFormat::Png, 80, 4096);
        let out = resizer
            .transform(&png(200, 100), &OperationSet::new(None, Some(50)))
            .unwrap();
        assert_eq!((out.width, out.height), (100, 50));
    }

    #[test]
    fn test_both_dimensions_fill_exactly() {
        let resizer = ImageResizer::new(OutputFormat::Png, 80, 4096);
        let out = resizer
            .transform(&png(200, 100), &OperationSet::new(Some(50), Some(50)))
            .unwrap();
        assert_eq!(dims(&out.data), (50, 50));
    }

    #[test]
    fn test_original_reencodes_at_source_size() {
        let resizer = ImageResizer::new(OutputFormat::Jpeg, 80, 4096);
        let out = resizer
            .transform(&png(64, 48), &OperationSet::original())
            .unwrap();
        assert_eq!(out.content_type, "image/jpeg");
        assert_eq!(
            image::guess_format(&out.data).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(dims(&out.data), (64, 48));
    }

    #[test]
    fn test_webp_output() {
        let resizer = ImageResizer::new(OutputFormat::Webp, 80, 4096);
        let out = resizer
            .transform(&png(20, 20), &OperationSet::new(Some(10), None))
            .unwrap();
        assert_eq!(out.content_type, "image/webp");
        assert_eq!(image::guess_format(&out.data).unwrap(), ImageFormat::WebP);
    }

    #[test]
    fn test_tiny_source_never_scales_to_zero() {
        let resizer = ImageResizer::new(OutputFormat::Png, 80, 4096);
        let out = resizer
            .transform(&png(100, 1), &OperationSet::new(Some(10), None))
            .unwrap();
        assert_eq!((out.width, out.height), (10, 1));
    }

    #[test]
    fn test_rejects_oversized_dimensions() {
        let resizer = ImageResizer::new(OutputFormat::Png, 80, 100);
        let result = resizer.transform(&png(10, 10), &OperationSet::new(Some(101), None));
        assert!(matches!(result, Err(ImagingError::InvalidDimensions(_))));
    }

    #[test]
    fn test_rejects_oversized_derived_dimension() {
        let resizer = ImageResizer::new(OutputFormat::Png, 80, 4096);

        let tall = resizer.transform(&png(1, 3000), &OperationSet::new(Some(4000), None));
        assert!(matches!(tall, Err(ImagingError::InvalidDimensions(_))));

        let wide = resizer.transform(&png(3000, 1), &OperationSet::new(None, Some(4000)));
        assert!(matches!(wide, Err(ImagingError::InvalidDimensions(_))));
    }

    #[test]
    fn test_derived_dimension_at_limit_is_allowed() {
        let resizer = ImageResizer::new(OutputFormat::Png, 80, 100);
        let out = resizer
            .transform(&png(10, 20), &OperationSet::new(Some(50), None))
            .unwrap();
        assert_eq!((out.width, out.height), (50, 100));
    }

    #[test]
    fn test_rejects_garbage_and_empty_input() {
        let resizer = ImageResizer::new(OutputFormat::Png, 80, 4096);
        assert!(matches!(
            resizer.transform(b"not an image", &OperationSet::original()),
            Err(ImagingError::Decode(_))
        ));
        assert!(matches!(
            resizer.transform(b"", &OperationSet::original()),
            Err(ImagingError::Decode(_))
        ));
    }

    #[test]
    fn test_scaled_rounds() {
        assert_eq!(scaled(100, 1, 3), 33);
        assert_eq!(scaled(100, 2, 3), 67);
        assert_eq!(scaled(1, 1, 1000), 1);
    }
}
