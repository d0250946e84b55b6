//! obsign-api server entry point.

use std::net::SocketAddr;

use anyhow::Context;
use obsign_api::auth::AuthConfig;
use obsign_api::bootstrap::build_state;
use obsign_api::{app, AppConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(config = ?config, "starting obsign-api");

    let state = build_state(&config).await?;
    let auth = AuthConfig::new(config.auth_token.clone());
    if !auth.is_enabled() {
        tracing::warn!("AUTH_TOKEN not set; /v1 routes are unauthenticated");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("obsign-api listening on {addr}");

    axum::serve(listener, app(state, auth).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

/// `info` unless `RUST_LOG` says otherwise; `LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
