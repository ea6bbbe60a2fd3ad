//! Resize operation set and its canonical string encoding.
//!
//! The canonical string is the last segment of every cache key. It is either the
//! sentinel `original` or a comma-joined `key=value` list in fixed key order
//! (`width` before `height`), so the encoding depends only on the set of valid
//! operations and never on the order parameters arrived in.

use std::fmt;

/// Sentinel operation string for the identity transform.
pub const ORIGINAL: &str = "original";

/// Recognised operation keys, in canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKey {
    Width,
    Height,
}

impl OperationKey {
    /// All keys in canonical order.
    pub const ALL: [OperationKey; 2] = [OperationKey::Width, OperationKey::Height];

    /// Match a parameter name case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("width") {
            Some(Self::Width)
        } else if name.eq_ignore_ascii_case("height") {
            Some(Self::Height)
        } else {
            None
        }
    }

    /// Get the canonical (lower-case) name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated set of resize operations.
///
/// An empty set is the identity transform and encodes as [`ORIGINAL`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OperationSet {
    width: Option<u32>,
    height: Option<u32>,
}

impl OperationSet {
    /// The identity transform.
    pub const fn original() -> Self {
        Self {
            width: None,
            height: None,
        }
    }

    /// Build a set from optional dimensions. Zero values are dropped.
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            width: width.filter(|w| *w > 0),
            height: height.filter(|h| *h > 0),
        }
    }

    /// Target width, if set.
    pub fn width(&self) -> Option<u32> {
        self.width
    }

    /// Target height, if set.
    pub fn height(&self) -> Option<u32> {
        self.height
    }

    /// Get the value for a key.
    pub fn get(&self, key: OperationKey) -> Option<u32> {
        match key {
            OperationKey::Width => self.width,
            OperationKey::Height => self.height,
        }
    }

    /// Whether this is the identity transform.
    pub fn is_original(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }

    /// Set a key only if it has no value yet. Returns whether the value was taken.
    fn insert_first(&mut self, key: OperationKey, value: u32) -> bool {
        let slot = match key {
            OperationKey::Width => &mut self.width,
            OperationKey::Height => &mut self.height,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    /// Iterate the set operations in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (OperationKey, u32)> + '_ {
        OperationKey::ALL
            .into_iter()
            .filter_map(|key| self.get(key).map(|value| (key, value)))
    }

    /// Decode a canonical operation string.
    ///
    /// Best effort: unknown keys and malformed tokens are ignored, so a garbled
    /// suffix degrades to the identity transform instead of failing.
    pub fn parse(canonical: &str) -> Self {
        let mut ops = Self::original();
        for token in canonical.split(',') {
            let Some((name, value)) = token.split_once('=') else {
                continue;
            };
            if let (Some(key), Some(value)) = (OperationKey::parse(name), parse_dimension(value))
            {
                ops.insert_first(key, value);
            }
        }
        ops
    }

    /// Build the operation set from raw query parameters.
    ///
    /// Names are matched case-insensitively and the first valid value for each key
    /// wins. Returns the set together with its canonical string.
    pub fn canonicalize<I, K, V>(params: I) -> (Self, String)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut ops = Self::original();
        for (name, value) in params {
            let Some(key) = OperationKey::parse(name.as_ref()) else {
                continue;
            };
            if let Some(value) = parse_dimension(value.as_ref()) {
                ops.insert_first(key, value);
            }
        }
        let canonical = ops.canonical();
        (ops, canonical)
    }

    /// Encode as the canonical operation string.
    pub fn canonical(&self) -> String {
        if self.is_original() {
            return ORIGINAL.to_string();
        }
        self.iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Encode as a user-facing query string (`width=50&height=50`).
    ///
    /// Empty for the identity transform.
    pub fn to_query_string(&self) -> String {
        self.iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Parse a dimension the way browsers' `parseInt` reads a query value.
///
/// Leading whitespace and an optional sign are accepted. A `0x`/`0X` prefix
/// switches to hexadecimal. The longest run of digits is taken and anything after
/// it is ignored (`"100px"` is 100). Returns `None` for no digits, zero, negative
/// values, or values over `u32::MAX`.
pub fn parse_dimension(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, rest) = match rest.get(..2) {
        Some("0x" | "0X") => (16, &rest[2..]),
        _ => (10, rest),
    };

    let digits_len = rest.bytes().take_while(|b| (*b as char).is_digit(radix)).count();
    if digits_len == 0 {
        return None;
    }

    let digits = &rest[..digits_len];
    if negative {
        // "-0" parses to zero, which is not positive either.
        return None;
    }

    match u32::from_str_radix(digits, radix) {
        Ok(value) if value > 0 => Some(value),
        _ => None,
    }
}
