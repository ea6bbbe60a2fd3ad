//! Shared-secret gate for the transform handler.

use cachecow_core::TokenEnvelope;
use cachecow_secrets::SecretStore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Verifies the credential presented on transform requests.
///
/// The expected envelope is fetched from the secret store on first use and kept
/// for the lifetime of the process. A failed fetch is not cached, so the next
/// request retries.
pub struct TokenVerifier {
    store: Arc<dyn SecretStore>,
    expected: OnceCell<TokenEnvelope>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("backend", &self.store.backend_name())
            .field("secret_id", &self.store.secret_id())
            .field("loaded", &self.expected.initialized())
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            expected: OnceCell::new(),
        }
    }

    /// The expected envelope, loading it on first call.
    async fn expected(&self) -> Option<&TokenEnvelope> {
        let result = self
            .expected
            .get_or_try_init(|| async {
                let raw = self.store.get_secret().await.map_err(|e| e.to_string())?;
                TokenEnvelope::parse(&raw).map_err(|e| e.to_string())
            })
            .await;

        match result {
            Ok(envelope) => Some(envelope),
            Err(error) => {
                tracing::warn!(
                    backend = self.store.backend_name(),
                    secret_id = self.store.secret_id(),
                    error = %error,
                    "Failed to load access token"
                );
                None
            }
        }
    }

    /// Check a presented header value. Fails closed on every error.
    ///
    /// The presented value is parsed before the secret store is consulted, so a
    /// missing or malformed header costs no secret read.
    pub async fn verify(&self, presented: Option<&str>) -> bool {
        let Some(presented) = presented else {
            return false;
        };
        let Ok(presented) = TokenEnvelope::parse(presented) else {
            return false;
        };
        let Some(expected) = self.expected().await else {
            return false;
        };
        token_digest(presented.token()) == token_digest(expected.token())
    }

    /// The header value to attach when forwarding to the transform handler.
    pub async fn credential(&self) -> Option<String> {
        self.expected().await.map(TokenEnvelope::to_json)
    }
}

/// SHA-256 of a token. Raw tokens are never compared directly.
fn token_digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachecow_secrets::{SecretError, SecretResult, StaticSecretStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts reads and fails the first `failures` of them.
    struct FlakyStore {
        value: String,
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SecretStore for FlakyStore {
        async fn get_secret(&self) -> SecretResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(SecretError::NotFound("flaky".to_string()))
            } else {
                Ok(self.value.clone())
            }
        }

        fn secret_id(&self) -> &str {
            "flaky"
        }

        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    fn verifier(value: &str) -> TokenVerifier {
        TokenVerifier::new(Arc::new(StaticSecretStore::new(value)))
    }

    #[tokio::test]
    async fn test_matching_token_verifies() {
        let v = verifier(r#"{"token":"moo"}"#);
        assert!(v.verify(Some(r#"{"token":"moo"}"#)).await);
        assert!(!v.verify(Some(r#"{"token":"baa"}"#)).await);
    }

    #[tokio::test]
    async fn test_fails_closed() {
        let v = verifier(r#"{"token":"moo"}"#);
        assert!(!v.verify(None).await);
        assert!(!v.verify(Some("")).await);
        assert!(!v.verify(Some("moo")).await);
        assert!(!v.verify(Some("{}")).await);
        assert!(!v.verify(Some(r#"{"token":""}"#)).await);
    }

    #[tokio::test]
    async fn test_missing_expected_field_fails_closed() {
        // A secret without a token must never match a header without one.
        let v = verifier(r#"{"other":"x"}"#);
        assert!(!v.verify(Some(r#"{"other":"x"}"#)).await);
        assert!(!v.verify(Some(r#"{"token":"x"}"#)).await);
        assert!(v.credential().await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_header_skips_secret_read() {
        let store = Arc::new(FlakyStore {
            value: r#"{"token":"moo"}"#.to_string(),
            failures: 0,
            calls: AtomicUsize::new(0),
        });
        let v = TokenVerifier::new(store.clone());

        assert!(!v.verify(None).await);
        assert!(!v.verify(Some("not json")).await);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_is_cached_and_failure_retried() {
        let store = Arc::new(FlakyStore {
            value: r#"{"token":"moo"}"#.to_string(),
            failures: 1,
            calls: AtomicUsize::new(0),
        });
        let v = TokenVerifier::new(store.clone());

        assert!(!v.verify(Some(r#"{"token":"moo"}"#)).await);
        assert!(v.verify(Some(r#"{"token":"moo"}"#)).await);
        assert!(v.verify(Some(r#"{"token":"moo"}"#)).await);
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_credential_round_trips_through_verify() {
        let v = verifier(r#"{"token":"moo","note":"ignored"}"#);
        let credential = v.credential().await.unwrap();
        assert!(v.verify(Some(&credential)).await);
    }

    #[test]
    fn test_token_digest() {
        assert_eq!(token_digest("abc"), token_digest("abc"));
        assert_ne!(token_digest("abc"), token_digest("abd"));
        assert_ne!(token_digest("abc"), token_digest("ab"));
    }

    #[tokio::test]
    async fn test_prefix_of_expected_token_is_rejected() {
        let v = verifier(r#"{"token":"moooo"}"#);
        assert!(!v.verify(Some(r#"{"token":"moo"}"#)).await);
        assert!(!v.verify(Some(r#"{"token":"mooooo"}"#)).await);
    }
}
