//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which half of the protocol this process serves.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServerRole {
    /// Transform-on-miss origin: only ever reached through the CDN fallback.
    #[default]
    Transform,
    /// Local edge emulation: rewrite, read the cache store, fall back to the
    /// in-process transform handler.
    Edge,
}

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Role of this process.
    #[serde(default)]
    pub role: ServerRole,
    /// Enable the /_cachecow/metrics endpoint for Prometheus scraping.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Header carrying the token envelope on transform requests.
    #[serde(default = "default_secret_header")]
    pub secret_header: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_secret_header() -> String {
    crate::token::DEFAULT_SECRET_HEADER.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            role: ServerRole::default(),
            metrics_enabled: default_metrics_enabled(),
            secret_header: default_secret_header(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.secret_header.is_empty() {
            return Err("server.secret_header cannot be empty".to_string());
        }
        if !self
            .secret_header
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(format!(
                "server.secret_header is not a valid header name: {}",
                self.secret_header
            ));
        }
        Ok(())
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
    /// S3-compatible storage.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for MinIO, etc.).
        endpoint: Option<String>,
        /// AWS region.
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// AWS access key ID. Falls back to the ambient credential chain if not set.
        access_key_id: Option<String>,
        /// AWS secret access key. Falls back to the ambient credential chain if not set.
        secret_access_key: Option<String>,
        /// Force path-style URLs (`endpoint/bucket/key`). Required for MinIO.
        #[serde(default)]
        force_path_style: bool,
    },
}

impl StorageConfig {
    /// Filesystem storage rooted at `path`.
    pub fn filesystem(path: impl Into<PathBuf>) -> Self {
        Self::Filesystem { path: path.into() }
    }

    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::S3 {
                bucket,
                access_key_id,
                secret_access_key,
                ..
            } => {
                if bucket.is_empty() {
                    return Err("s3 config requires a bucket".to_string());
                }
                match (access_key_id.as_ref(), secret_access_key.as_ref()) {
                    (Some(_), Some(_)) | (None, None) => Ok(()),
                    _ => Err(
                        "s3 config requires both access_key_id and secret_access_key when either is set"
                            .to_string(),
                    ),
                }
            }
            _ => Ok(()),
        }
    }

    /// Whether two configs address the same objects.
    fn overlaps(&self, other: &StorageConfig) -> bool {
        match (self, other) {
            (Self::Filesystem { path: a }, Self::Filesystem { path: b }) => a == b,
            (
                Self::S3 {
                    bucket: a,
                    prefix: pa,
                    endpoint: ea,
                    ..
                },
                Self::S3 {
                    bucket: b,
                    prefix: pb,
                    endpoint: eb,
                    ..
                },
            ) => a == b && pa == pb && ea == eb,
            _ => false,
        }
    }
}

/// Where the shared access token is read from.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecretConfig {
    /// AWS Secrets Manager secret, addressed by name or ARN.
    AwsSecretsManager {
        /// Secret name or ARN.
        secret_id: String,
        /// AWS region.
        region: Option<String>,
        /// Optional endpoint URL (for LocalStack, etc.).
        endpoint: Option<String>,
    },
    /// Read from an environment variable.
    Env {
        /// Environment variable name.
        var: String,
    },
    /// Read from a file.
    File {
        /// Path to the file.
        path: PathBuf,
    },
    /// Inline value (not recommended for production).
    Value {
        /// The token envelope JSON.
        value: String,
    },
}

impl SecretConfig {
    /// Identifier of the secret, for logging.
    pub fn identifier(&self) -> String {
        match self {
            Self::AwsSecretsManager { secret_id, .. } => secret_id.clone(),
            Self::Env { var } => format!("env:{var}"),
            Self::File { path } => format!("file:{}", path.display()),
            Self::Value { .. } => "inline".to_string(),
        }
    }

    /// Validate secret configuration.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::AwsSecretsManager { secret_id, .. } if secret_id.is_empty() => {
                Err("secret.secret_id cannot be empty".to_string())
            }
            Self::Env { var } if var.is_empty() => Err("secret.var cannot be empty".to_string()),
            _ => Ok(()),
        }
    }
}

/// Image format written for every variant.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    /// MIME type of the emitted bytes.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }
}

/// What to answer when the original asset does not exist.
///
/// Applied uniformly to every request served by the process.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingOriginalPolicy {
    /// Respond 404.
    #[default]
    NotFound,
    /// Respond 200 with a generated solid-colour image that is never cached.
    Placeholder,
}

/// Placeholder image settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaceholderConfig {
    #[serde(default = "default_placeholder_side")]
    pub width: u32,
    #[serde(default = "default_placeholder_side")]
    pub height: u32,
    /// RGB fill colour.
    #[serde(default = "default_placeholder_color")]
    pub color: [u8; 3],
}

fn default_placeholder_side() -> u32 {
    100
}

fn default_placeholder_color() -> [u8; 3] {
    [255, 0, 0]
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            width: default_placeholder_side(),
            height: default_placeholder_side(),
            color: default_placeholder_color(),
        }
    }
}

/// Transform pipeline configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Format of stored variants.
    #[serde(default)]
    pub output_format: OutputFormat,
    /// JPEG quality (1-100). Ignored for other formats.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Largest accepted width or height.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Wall-clock budget for one transform request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Policy for a missing original.
    #[serde(default)]
    pub missing_original: MissingOriginalPolicy,
    /// Placeholder settings, used with [`MissingOriginalPolicy::Placeholder`].
    #[serde(default)]
    pub placeholder: PlaceholderConfig,
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_max_dimension() -> u32 {
    4096
}

fn default_request_timeout_secs() -> u64 {
    25
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            jpeg_quality: default_jpeg_quality(),
            max_dimension: default_max_dimension(),
            request_timeout_secs: default_request_timeout_secs(),
            missing_original: MissingOriginalPolicy::default(),
            placeholder: PlaceholderConfig::default(),
        }
    }
}

impl TransformConfig {
    /// Get the request budget as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate transform configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!(
                "transform.jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            ));
        }
        if self.max_dimension == 0 {
            return Err("transform.max_dimension must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("transform.request_timeout_secs must be greater than 0".to_string());
        }
        if self.placeholder.width == 0 || self.placeholder.height == 0 {
            return Err("transform.placeholder dimensions must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Edge emulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Cache store statuses that send the request to the transform handler.
    #[serde(default = "default_failover_statuses")]
    pub failover_statuses: Vec<u16>,
}

fn default_failover_statuses() -> Vec<u16> {
    vec![403, 404, 500, 502, 503, 504]
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            failover_statuses: default_failover_statuses(),
        }
    }
}

impl EdgeConfig {
    /// Whether a cache store status triggers the fallback.
    pub fn fails_over(&self, status: u16) -> bool {
        self.failover_statuses.contains(&status)
    }

    /// Validate edge configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(status) = self
            .failover_statuses
            .iter()
            .find(|s| !(400..=599).contains(*s))
        {
            return Err(format!(
                "edge.failover_statuses may only contain 4xx/5xx statuses, got {status}"
            ));
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Store holding original assets.
    #[serde(default = "default_source_storage")]
    pub source: StorageConfig,
    /// Store holding transformed variants.
    #[serde(default = "default_cache_storage")]
    pub cache: StorageConfig,
    /// Shared access token source (required).
    pub secret: SecretConfig,
    /// Transform pipeline configuration.
    #[serde(default)]
    pub transform: TransformConfig,
    /// Edge emulation configuration.
    #[serde(default)]
    pub edge: EdgeConfig,
}

fn default_source_storage() -> StorageConfig {
    StorageConfig::filesystem("./data/source")
}

fn default_cache_storage() -> StorageConfig {
    StorageConfig::filesystem("./data/cache")
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses filesystem storage and an inline token.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            source: default_source_storage(),
            cache: default_cache_storage(),
            secret: SecretConfig::Value {
                value: r#"{"token":"test-token"}"#.to_string(),
            },
            transform: TransformConfig::default(),
            edge: EdgeConfig::default(),
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.source
            .validate()
            .map_err(|e| format!("source: {e}"))?;
        self.cache.validate().map_err(|e| format!("cache: {e}"))?;
        if self.source.overlaps(&self.cache) {
            return Err("source and cache must be distinct stores".to_string());
        }
        self.secret.validate()?;
        self.transform.validate()?;
        self.edge.validate()?;
        Ok(())
    }
}
