//! # Application State & Configuration
//!
//! Shared state for the Axum application: the engine, the webhook
//! processor, and the environment-driven configuration. All fields are
//! `Arc`-wrapped so the state clones cheaply into every handler.

use std::sync::Arc;

use dsp_engine::BookingEngine;
use dsp_payments::{InstantTransferClient, SignatureVerifier, TransferClient, WebhookProcessor};
use dsp_store::MemoryStore;

/// Environment-driven configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen port (`DSP_PORT`, default 8080).
    pub port: u16,
    /// Webhook endpoint secret (`DSP_WEBHOOK_SECRET`).
    pub webhook_secret: String,
}

impl AppConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let port = std::env::var("DSP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);
        let webhook_secret = std::env::var("DSP_WEBHOOK_SECRET")
            .unwrap_or_else(|_| "whsec_dev_secret".to_string());
        Self {
            port,
            webhook_secret,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            webhook_secret: "whsec_dev_secret".to_string(),
        }
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// The operation surface.
    pub engine: Arc<BookingEngine<MemoryStore>>,
    /// The webhook processor.
    pub processor: Arc<WebhookProcessor<MemoryStore>>,
    /// Startup configuration.
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// State over a fresh in-memory store with the development transfer
    /// client. Production deployments substitute their own store and
    /// transfer client here.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// State with explicit configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self::with_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(InstantTransferClient),
            config,
        )
    }

    /// State over explicit store and transfer client — the test suite's
    /// entry point.
    pub fn with_parts(
        store: Arc<MemoryStore>,
        transfers: Arc<dyn TransferClient>,
        config: AppConfig,
    ) -> Self {
        let engine = Arc::new(BookingEngine::new(store.clone(), transfers));
        let processor = Arc::new(WebhookProcessor::new(
            store,
            SignatureVerifier::new(config.webhook_secret.clone()),
        ));
        Self {
            engine,
            processor,
            config: Arc::new(config),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
