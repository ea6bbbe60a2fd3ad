//! Edge request rewriting.
//!
//! Converts `/{assetPath}?width=..&height=..` into the canonical
//! `/{assetPath}/{operations}` form with no query string. The rewritten path is
//! what the cache store is keyed on, so it must not depend on parameter order.

use crate::operations::OperationSet;

/// Result of rewriting an incoming request URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewrittenUri {
    /// Canonical path: `{assetPath}/{canonicalOperationString}`.
    pub path: String,
    /// The operations the query string decoded to.
    pub operations: OperationSet,
}

impl RewrittenUri {
    /// The rewritten URI. The query string is always dropped.
    pub fn as_uri(&self) -> &str {
        &self.path
    }
}

/// Rewrite an incoming path and optional raw query string.
///
/// Runs in bounded time with no I/O. An absent query, an empty query, or a query
/// with only unrecognised or invalid parameters yields a path ending in `/original`.
pub fn rewrite_uri(path: &str, query: Option<&str>) -> RewrittenUri {
    let (operations, canonical) = match query {
        Some(query) if !query.is_empty() => {
            OperationSet::canonicalize(url::form_urlencoded::parse(query.as_bytes()))
        }
        _ => OperationSet::canonicalize(std::iter::empty::<(&str, &str)>()),
    };

    let base = path.trim_end_matches('/');
    RewrittenUri {
        path: format!("{base}/{canonical}"),
        operations,
    }
}
