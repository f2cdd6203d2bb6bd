//! llm-relay server binary.
//!
//! Resolves configuration from the environment (and an optional `.env`
//! file), then serves `GET /` and `GET /api`.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use llm_relay::config::{Cli, Config};
use llm_relay::server::routes::{build_router, cors_layer, AppState};
use llm_relay::{Dispatcher, Provider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "llm_relay=debug,tower_http=debug"
    } else {
        "llm_relay=info,tower_http=info"
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true);

    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("llm-relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Arc::new(Config::from_env(&cli.env_file)?);

    info!(
        provider = %config.provider,
        hosted_model = %config.hosted.model,
        hosted_stream_model = %config.hosted.stream_model,
        local_model = %config.local.model,
        local_host = %config.local.host,
        "Configuration loaded"
    );

    // Misconfiguration is reported per request; flag it early for operators.
    match config.provider() {
        Ok(Provider::Hosted) if config.hosted.api_key.is_none() => {
            warn!("Hosted provider selected but no API key is configured")
        }
        Ok(_) => {}
        Err(e) => warn!("{e}; requests will be rejected"),
    }

    let dispatcher = Dispatcher::from_config(config)?;
    let state = Arc::new(AppState { dispatcher });

    // Build the HTTP router.
    let app = build_router(state, cors_layer(&cli.allow_origins)?);

    // Start the server.
    let listener = TcpListener::bind(&cli.listen).await?;
    info!("Listening on {}", cli.listen);

    axum::serve(listener, app).await?;

    Ok(())
}
