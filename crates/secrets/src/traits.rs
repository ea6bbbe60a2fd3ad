//! Secret store trait.

use crate::error::SecretResult;
use async_trait::async_trait;

/// A source for the shared access token envelope.
///
/// Each store is bound to one secret at construction. Implementations do not
/// cache; callers decide how long a value is kept.
#[async_trait]
pub trait SecretStore: Send + Sync + 'static {
    /// Fetch the raw secret string.
    async fn get_secret(&self) -> SecretResult<String>;

    /// Identifier of the bound secret, for logging. Never the value.
    fn secret_id(&self) -> &str;

    /// Get the name of this secret backend.
    fn backend_name(&self) -> &'static str;
}
