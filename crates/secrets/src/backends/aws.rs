//! AWS Secrets Manager backend.

use crate::error::{SecretError, SecretResult};
use crate::traits::SecretStore;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::Client;
use aws_smithy_http_client::Builder as SmithyHttpClientBuilder;
use tokio::sync::OnceCell;
use tracing::instrument;

/// Reads one secret from AWS Secrets Manager.
///
/// The SDK client is built on first use, so constructing the store has no
/// network or credential-chain side effects.
pub struct AwsSecretsManagerStore {
    secret_id: String,
    region: Option<String>,
    endpoint: Option<String>,
    client: OnceCell<Client>,
}

impl std::fmt::Debug for AwsSecretsManagerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManagerStore")
            .field("secret_id", &self.secret_id)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AwsSecretsManagerStore {
    /// Create a store bound to `secret_id` (name or ARN).
    pub async fn new(
        secret_id: &str,
        region: Option<String>,
        endpoint: Option<String>,
    ) -> SecretResult<Self> {
        if secret_id.is_empty() {
            return Err(SecretError::Config("secret_id cannot be empty".to_string()));
        }

        // Bare host:port endpoints (e.g. "localstack:4566") are treated as plain HTTP.
        let endpoint = endpoint.map(|url| {
            let lower = url.to_ascii_lowercase();
            if lower.starts_with("http://") || lower.starts_with("https://") {
                url
            } else {
                format!("http://{url}")
            }
        });

        Ok(Self {
            secret_id: secret_id.to_string(),
            region,
            endpoint,
            client: OnceCell::new(),
        })
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| async {
                let mut loader = aws_config::defaults(BehaviorVersion::latest());
                if let Some(region) = &self.region {
                    loader = loader.region(aws_config::Region::new(region.clone()));
                }
                let shared = loader.load().await;

                let mut builder = aws_sdk_secretsmanager::config::Builder::from(&shared);
                if let Some(endpoint) = &self.endpoint {
                    builder = builder.endpoint_url(endpoint);
                    if endpoint.starts_with("http://") {
                        builder = builder.http_client(SmithyHttpClientBuilder::new().build_http());
                    }
                }
                Client::from_conf(builder.build())
            })
            .await
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManagerStore {
    #[instrument(skip(self), fields(backend = "aws_secrets_manager", secret_id = %self.secret_id))]
    async fn get_secret(&self) -> SecretResult<String> {
        let output = self
            .client()
            .await
            .get_secret_value()
            .secret_id(&self.secret_id)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception())
                {
                    SecretError::NotFound(self.secret_id.clone())
                } else {
                    SecretError::Aws(Box::new(err))
                }
            })?;

        if let Some(value) = output.secret_string() {
            return Ok(value.to_string());
        }

        // Binary secrets are accepted when they hold UTF-8 text.
        output
            .secret_binary()
            .and_then(|blob| String::from_utf8(blob.as_ref().to_vec()).ok())
            .ok_or_else(|| SecretError::Empty(self.secret_id.clone()))
    }

    fn secret_id(&self) -> &str {
        &self.secret_id
    }

    fn backend_name(&self) -> &'static str {
        "aws_secrets_manager"
    }
}
