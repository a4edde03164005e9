//! # dsp-api Server Entry Point
//!
//! Boots the development server: in-memory store, instant transfer
//! client, tracing subscriber, and the assembled router. Production
//! deployments wire their own store and transfer client through
//! `AppState::with_parts`.

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use dsp_api::{app, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let port = config.port;
    let state = AppState::with_config(config);
    let router = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("dsp-api listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
