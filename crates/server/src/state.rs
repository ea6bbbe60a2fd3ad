//! Application state shared across handlers.

use crate::verifier::TokenVerifier;
use cachecow_core::config::AppConfig;
use cachecow_imaging::ImageTransformer;
use cachecow_secrets::SecretStore;
use cachecow_storage::ObjectStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Read-only store holding the originals.
    pub source: Arc<dyn ObjectStore>,
    /// Store receiving transformed variants, served publicly.
    pub cache: Arc<dyn ObjectStore>,
    /// Gate for transform requests.
    pub verifier: Arc<TokenVerifier>,
    /// Image resampler.
    pub transformer: Arc<dyn ImageTransformer>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        source: Arc<dyn ObjectStore>,
        cache: Arc<dyn ObjectStore>,
        secrets: Arc<dyn SecretStore>,
        transformer: Arc<dyn ImageTransformer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            source,
            cache,
            verifier: Arc::new(TokenVerifier::new(secrets)),
            transformer,
        }
    }
}
