//! Instrumented stores for counting and failure injection.

use async_trait::async_trait;
use bytes::Bytes;
use cachecow_secrets::{SecretResult, SecretStore, StaticSecretStore};
use cachecow_storage::{
    ObjectMeta, ObjectStore, PutOptions, StorageError, StorageResult, StoredObject,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Wraps a store and counts reads and writes.
#[allow(dead_code)]
pub struct CountingStore {
    inner: Arc<dyn ObjectStore>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Calls to `get`, `get_object`, `head` and `exists`.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &Arc<dyn ObjectStore> {
        &self.inner
    }
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(key).await
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.head(key).await
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_object(key).await
    }

    async fn put(&self, key: &str, data: Bytes, options: &PutOptions) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, data, options).await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.inner.health_check().await
    }
}

/// A store whose every operation fails with an I/O error.
#[allow(dead_code)]
pub struct FailingStore;

fn injected() -> StorageError {
    StorageError::Io(std::io::Error::other("injected failure"))
}

#[async_trait]
impl ObjectStore for FailingStore {
    async fn exists(&self, _key: &str) -> StorageResult<bool> {
        Err(injected())
    }

    async fn head(&self, _key: &str) -> StorageResult<ObjectMeta> {
        Err(injected())
    }

    async fn get(&self, _key: &str) -> StorageResult<Bytes> {
        Err(injected())
    }

    async fn get_object(&self, _key: &str) -> StorageResult<StoredObject> {
        Err(injected())
    }

    async fn put(&self, _key: &str, _data: Bytes, _options: &PutOptions) -> StorageResult<()> {
        Err(injected())
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn health_check(&self) -> StorageResult<()> {
        Err(injected())
    }
}

/// Delays reads and writes by a fixed duration before delegating.
#[allow(dead_code)]
pub struct SlowStore {
    inner: Arc<dyn ObjectStore>,
    delay: Duration,
}

#[allow(dead_code)]
impl SlowStore {
    pub fn new(inner: Arc<dyn ObjectStore>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl ObjectStore for SlowStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        self.inner.head(key).await
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_object(key).await
    }

    async fn put(&self, key: &str, data: Bytes, options: &PutOptions) -> StorageResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.put(key, data, options).await
    }

    fn backend_name(&self) -> &'static str {
        "slow"
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.inner.health_check().await
    }
}

/// Secret store that counts reads.
#[allow(dead_code)]
pub struct CountingSecretStore {
    inner: StaticSecretStore,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl CountingSecretStore {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: StaticSecretStore::new(value),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for CountingSecretStore {
    async fn get_secret(&self) -> SecretResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_secret().await
    }

    fn secret_id(&self) -> &str {
        "counting"
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}
