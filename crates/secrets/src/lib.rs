//! Secret sources for CacheCow.
//!
//! The transform handler is gated by one shared token. This crate reads it from
//! AWS Secrets Manager in production, or from an environment variable, a file,
//! or an inline value for development and tests.

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::aws::AwsSecretsManagerStore;
pub use backends::local::{EnvSecretStore, FileSecretStore, StaticSecretStore};
pub use error::{SecretError, SecretResult};
pub use traits::SecretStore;

use cachecow_core::config::SecretConfig;
use std::sync::Arc;

/// Create a secret store from configuration.
pub async fn from_config(config: &SecretConfig) -> SecretResult<Arc<dyn SecretStore>> {
    config.validate().map_err(SecretError::Config)?;

    match config {
        SecretConfig::AwsSecretsManager {
            secret_id,
            region,
            endpoint,
        } => {
            let store =
                AwsSecretsManagerStore::new(secret_id, region.clone(), endpoint.clone()).await?;
            Ok(Arc::new(store))
        }
        SecretConfig::Env { var } => Ok(Arc::new(EnvSecretStore::new(var))),
        SecretConfig::File { path } => Ok(Arc::new(FileSecretStore::new(path))),
        SecretConfig::Value { value } => {
            tracing::warn!("Using inline access token (not recommended for production)");
            Ok(Arc::new(StaticSecretStore::new(value.clone())))
        }
    }
}
