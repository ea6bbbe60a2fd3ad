//! Core domain types and shared logic for the CacheCow image cache.
//!
//! This crate defines the data model shared by the edge and transform roles:
//! - Resize operation sets and their canonical encoding
//! - Asset paths and cache keys
//! - Edge URI rewriting
//! - The shared-secret token envelope
//! - Application configuration

pub mod cache_key;
pub mod config;
pub mod error;
pub mod operations;
pub mod rewrite;
pub mod token;

pub use cache_key::{AssetPath, CacheKey};
pub use error::{Error, Result};
pub use operations::{ORIGINAL, OperationKey, OperationSet, parse_dimension};
pub use rewrite::{RewrittenUri, rewrite_uri};
pub use token::{DEFAULT_SECRET_HEADER, TokenEnvelope};

/// Cache-Control for stored variants. Variants never change once written.
pub const VARIANT_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Cache-Control for redirects and every error or placeholder response.
pub const NO_STORE_CACHE_CONTROL: &str = "private, no-store, no-cache";
