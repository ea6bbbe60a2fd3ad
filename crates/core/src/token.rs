//! Shared-secret token envelope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default request header carrying the token envelope.
pub const DEFAULT_SECRET_HEADER: &str = "x-cachecow-secret";

/// The `{"token": "..."}` envelope used both for the stored secret and for the
/// credential presented on transform requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEnvelope {
    token: String,
}

impl TokenEnvelope {
    /// Create an envelope. Empty tokens are rejected.
    pub fn new(token: impl Into<String>) -> crate::Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(crate::Error::InvalidToken("token cannot be empty".to_string()));
        }
        Ok(Self { token })
    }

    /// Parse an envelope from its JSON form.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let envelope: Self = serde_json::from_str(raw)
            .map_err(|e| crate::Error::InvalidToken(format!("malformed token envelope: {e}")))?;
        Self::new(envelope.token)
    }

    /// Serialize to the JSON form sent in the credential header.
    pub fn to_json(&self) -> String {
        serde_json::json!({ "token": self.token }).to_string()
    }

    /// Get the raw token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for TokenEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEnvelope")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope() {
        let envelope = TokenEnvelope::parse(r#"{"token":"moo"}"#).unwrap();
        assert_eq!(envelope.token(), "moo");
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let a = TokenEnvelope::parse(r#"{"token":"moo","rotated":"2024-01-01"}"#).unwrap();
        let b = TokenEnvelope::parse(r#"{"token":"moo"}"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(TokenEnvelope::parse("moo").is_err());
        assert!(TokenEnvelope::parse("{}").is_err());
        assert!(TokenEnvelope::parse(r#"{"token":""}"#).is_err());
        assert!(TokenEnvelope::parse(r#"{"token":42}"#).is_err());
        assert!(TokenEnvelope::parse("").is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let envelope = TokenEnvelope::new("s3cr3t").unwrap();
        assert_eq!(TokenEnvelope::parse(&envelope.to_json()).unwrap(), envelope);
    }

    #[test]
    fn test_debug_redacts_token() {
        let envelope = TokenEnvelope::new("s3cr3t").unwrap();
        assert!(!format!("{envelope:?}").contains("s3cr3t"));
    }
}
