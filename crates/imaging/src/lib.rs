//! Image transforms for CacheCow.
//!
//! Decoding, resampling and encoding are delegated to the `image` crate. This
//! crate maps an [`OperationSet`](cachecow_core::OperationSet) onto it and
//! produces the placeholder served for missing originals.

mod encode;
pub mod error;
pub mod placeholder;
pub mod resize;

pub use error::{ImagingError, ImagingResult};
pub use placeholder::generate_placeholder;
pub use resize::{ImageResizer, ImageTransformer, TransformedImage};
