//! Secret stores for development and tests: environment, file and inline value.

use crate::error::{SecretError, SecretResult};
use crate::traits::SecretStore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads the secret from an environment variable on every call.
#[derive(Debug)]
pub struct EnvSecretStore {
    var: String,
}

impl EnvSecretStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self) -> SecretResult<String> {
        match std::env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            Ok(_) => Err(SecretError::Empty(self.var.clone())),
            Err(_) => Err(SecretError::NotFound(format!("env var not set: {}", self.var))),
        }
    }

    fn secret_id(&self) -> &str {
        &self.var
    }

    fn backend_name(&self) -> &'static str {
        "env"
    }
}

/// Reads the secret from a file on every call.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    id: String,
}

impl FileSecretStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let id = path.display().to_string();
        Self { path, id }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self) -> SecretResult<String> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SecretError::NotFound(self.id.clone())
            } else {
                SecretError::Io(e)
            }
        })?;
        let value = raw.trim();
        if value.is_empty() {
            return Err(SecretError::Empty(self.id.clone()));
        }
        Ok(value.to_string())
    }

    fn secret_id(&self) -> &str {
        &self.id
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

/// A fixed in-memory secret.
pub struct StaticSecretStore {
    value: String,
}

impl StaticSecretStore {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl std::fmt::Debug for StaticSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSecretStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret(&self) -> SecretResult<String> {
        Ok(self.value.clone())
    }

    fn secret_id(&self) -> &str {
        "inline"
    }

    fn backend_name(&self) -> &'static str {
        "value"
    }
}
