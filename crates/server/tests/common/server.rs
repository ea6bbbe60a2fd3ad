//! Server test utilities.

use super::fixtures::credential;
use super::mocks::{CountingSecretStore, CountingStore};
use axum::body::Body;
use axum::http::{Request, Response};
use bytes::Bytes;
use cachecow_core::config::{AppConfig, StorageConfig};
use cachecow_imaging::ImageResizer;
use cachecow_server::{AppState, create_router};
use cachecow_storage::{FilesystemBackend, ObjectStore, PutOptions, StoredObject};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with instrumented stores.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub source: Arc<CountingStore>,
    pub cache: Arc<CountingStore>,
    pub secrets: Arc<CountingSecretStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a transform server with temporary filesystem stores.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        Self::build(modifier, None, None).await
    }

    /// Create a test server whose cache store is replaced by `cache`.
    pub async fn with_cache_store<F>(modifier: F, cache: Arc<dyn ObjectStore>) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        Self::build(modifier, None, Some(cache)).await
    }

    /// Create a test server whose source store is replaced by `source`.
    pub async fn with_source_store<F>(modifier: F, source: Arc<dyn ObjectStore>) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        Self::build(modifier, Some(source), None).await
    }

    async fn build<F>(
        modifier: F,
        source_override: Option<Arc<dyn ObjectStore>>,
        cache_override: Option<Arc<dyn ObjectStore>>,
    ) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let source_path = temp_dir.path().join("source");
        let cache_path = temp_dir.path().join("cache");
        let source_backend: Arc<dyn ObjectStore> = match source_override {
            Some(store) => store,
            None => Arc::new(
                FilesystemBackend::new(&source_path)
                    .await
                    .expect("Failed to create source backend"),
            ),
        };
        let cache_backend: Arc<dyn ObjectStore> = match cache_override {
            Some(store) => store,
            None => Arc::new(
                FilesystemBackend::new(&cache_path)
                    .await
                    .expect("Failed to create cache backend"),
            ),
        };

        let mut config = AppConfig::for_testing();
        config.source = StorageConfig::filesystem(&source_path);
        config.cache = StorageConfig::filesystem(&cache_path);
        modifier(&mut config);
        config.validate().expect("Invalid test configuration");

        let source = Arc::new(CountingStore::new(source_backend));
        let cache = Arc::new(CountingStore::new(cache_backend));
        let secrets = Arc::new(CountingSecretStore::new(credential()));
        let transformer = Arc::new(ImageResizer::from_config(&config.transform));

        cachecow_server::metrics::register_metrics();

        let state = AppState::new(
            config,
            source.clone(),
            cache.clone(),
            secrets.clone(),
            transformer,
        );
        let router = create_router(state.clone());

        Self {
            router,
            state,
            source,
            cache,
            secrets,
            _temp_dir: temp_dir,
        }
    }

    /// Place an original in the source store without touching the counters.
    pub async fn seed_original(&self, key: &str, data: Bytes) {
        self.source
            .inner()
            .put(key, data, &PutOptions::default())
            .await
            .expect("Failed to seed original");
    }

    /// Read a variant from the cache store without touching the counters.
    pub async fn cached(&self, key: &str) -> Option<StoredObject> {
        self.cache.inner().get_object(key).await.ok()
    }

    /// Send a request, optionally carrying a credential header value.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        credential: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = credential {
            builder = builder.header(
                self.state.config.server.secret_header.as_str(),
                value,
            );
        }
        let request = builder.body(Body::empty()).expect("Failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed")
    }

    /// GET with the valid test credential.
    pub async fn get_authorized(&self, uri: &str) -> Response<Body> {
        self.request("GET", uri, Some(&credential())).await
    }
}

/// Collect a response body.
#[allow(dead_code)]
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
}

/// Collect a JSON error body.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body is not JSON")
}
