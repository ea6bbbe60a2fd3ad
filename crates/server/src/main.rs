//! CacheCow server binary.

use anyhow::{Context, Result};
use cachecow_core::config::AppConfig;
use cachecow_imaging::ImageResizer;
use cachecow_server::{AppState, create_router};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ENV_PREFIX: &str = "CACHECOW_";
const CONFIG_ENV: &str = "CACHECOW_CONFIG";

/// CacheCow - on-demand image transform and cache
#[derive(Parser, Debug)]
#[command(name = "cachecowd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "CACHECOW_CONFIG",
        default_value = "config/cachecow.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("CacheCow v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(Path::new(&args.config))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    tracing::info!(role = ?config.server.role, "Configuration loaded");

    if config.server.metrics_enabled {
        cachecow_server::metrics::register_metrics();
        tracing::info!("Prometheus metrics registered");
    }

    let source = cachecow_storage::from_config(&config.source)
        .await
        .context("failed to initialize source store")?;
    let cache = cachecow_storage::from_config(&config.cache)
        .await
        .context("failed to initialize cache store")?;

    // Fail before accepting traffic rather than report healthy with a dead store.
    source
        .health_check()
        .await
        .context("source store health check failed")?;
    cache
        .health_check()
        .await
        .context("cache store health check failed")?;
    tracing::info!(
        source = source.backend_name(),
        cache = cache.backend_name(),
        "Stores initialized"
    );

    let secrets = cachecow_secrets::from_config(&config.secret)
        .await
        .context("failed to initialize secret store")?;
    tracing::info!(
        backend = secrets.backend_name(),
        secret_id = secrets.secret_id(),
        "Secret store initialized"
    );

    let transformer = Arc::new(ImageResizer::from_config(&config.transform));
    let state = AppState::new(config.clone(), source, cache, secrets, transformer);

    // The token is loaded lazily; a failure here is retried per request.
    if state.verifier.credential().await.is_none() {
        tracing::warn!("Access token could not be loaded at startup, transforms will be refused until it is");
    }

    let app = create_router(state);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load configuration from an optional TOML file overlaid with `CACHECOW_*`
/// environment variables (`__` separates nesting levels).
fn load_config(path: &Path) -> Result<AppConfig> {
    let mut figment = Figment::new();
    let has_config_file = path.exists();

    if has_config_file {
        tracing::info!(config_path = %path.display(), "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}", path.display());
    }

    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with(ENV_PREFIX) && key != CONFIG_ENV);

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: cachecowd --config /path/to/cachecow.toml\n  \
             2. Environment variables: CACHECOW_SECRET__TYPE=env \
             CACHECOW_SECRET__VAR=CACHECOW_TOKEN cachecowd\n\n\
             Set CACHECOW_CONFIG to change the default config file path."
        );
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["config"]))
        .extract()
        .context("failed to load configuration")
}
