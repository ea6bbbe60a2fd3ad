//! Asset paths and cache keys.

use crate::operations::OperationSet;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::fmt;

/// Characters escaped when an asset path segment is rendered back into a URI.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

/// Identifier of an original image in the source store.
///
/// Held percent-decoded, without leading or trailing slashes. Empty segments
/// from repeated slashes are dropped.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AssetPath(String);

impl AssetPath {
    /// Create from an already-decoded key.
    pub fn new(path: impl AsRef<str>) -> crate::Result<Self> {
        let joined = path
            .as_ref()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        if joined.is_empty() {
            return Err(crate::Error::InvalidAssetPath(
                "asset path cannot be empty".to_string(),
            ));
        }
        if joined.chars().any(char::is_control) {
            return Err(crate::Error::InvalidAssetPath(
                "asset path contains control characters".to_string(),
            ));
        }

        Ok(Self(joined))
    }

    /// Create from a percent-encoded URI path.
    pub fn from_uri_path(path: &str) -> crate::Result<Self> {
        let decoded = percent_decode_str(path)
            .decode_utf8()
            .map_err(|e| crate::Error::InvalidAssetPath(format!("invalid UTF-8 in path: {e}")))?;
        Self::new(decoded)
    }

    /// Get the storage key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render as a percent-encoded absolute URI path (`/photos/a.jpg`).
    pub fn to_uri_path(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 1);
        for segment in self.0.split('/') {
            out.push('/');
            out.extend(utf8_percent_encode(segment, SEGMENT));
        }
        out
    }
}

impl fmt::Debug for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetPath({})", self.0)
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coordinate of a cached variant: `{assetPath}/{canonicalOperationString}`.
///
/// The same key is used by the edge to look a variant up and by the transform
/// handler to write it, so it is always rebuilt from the canonical encoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    asset: AssetPath,
    operations: OperationSet,
}

impl CacheKey {
    /// Create from components.
    pub fn new(asset: AssetPath, operations: OperationSet) -> Self {
        Self { asset, operations }
    }

    /// Split a canonical (rewritten) URI path into asset path and operations.
    ///
    /// The last segment is decoded with [`OperationSet::parse`], which never fails;
    /// only a missing asset path is an error.
    pub fn from_canonical_path(path: &str) -> crate::Result<Self> {
        let trimmed = path.trim_matches('/');
        let (asset, operations) = trimmed.rsplit_once('/').ok_or_else(|| {
            crate::Error::InvalidCacheKey(format!("missing operation segment: {path}"))
        })?;

        let operations = percent_decode_str(operations).decode_utf8_lossy();
        Ok(Self {
            asset: AssetPath::from_uri_path(asset)?,
            operations: OperationSet::parse(&operations),
        })
    }

    /// The original asset.
    pub fn asset(&self) -> &AssetPath {
        &self.asset
    }

    /// The resize operations.
    pub fn operations(&self) -> &OperationSet {
        &self.operations
    }

    /// Storage key in the cache store.
    pub fn storage_key(&self) -> String {
        format!("{}/{}", self.asset.as_str(), self.operations.canonical())
    }

    /// User-facing URL for this variant: asset path plus reconstructed query.
    pub fn public_location(&self) -> String {
        let query = self.operations.to_query_string();
        if query.is_empty() {
            self.asset.to_uri_path()
        } else {
            format!("{}?{}", self.asset.to_uri_path(), query)
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}
