//! # dsp-api — Axum API Services for the Dispatch Stack
//!
//! The transport layer over `dsp-engine` and `dsp-payments`.
//!
//! ## API Surface
//!
//! | Prefix                     | Module                 | Domain                 |
//! |----------------------------|------------------------|------------------------|
//! | `/v1/jobs/*`               | [`routes::jobs`]       | Job publication & reads |
//! | `/v1/bookings/*`           | [`routes::bookings`]   | Booking lifecycle, no-show, dispute |
//! | `/v1/webhooks/payments`    | [`routes::webhooks`]   | Provider event intake  |
//! | `/health/*`                | here                   | Probes (unauthenticated) |
//! | `/openapi.json`            | [`openapi`]            | OpenAPI 3 spec         |
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers — handlers deserialize,
//!   delegate to the engine/processor, and map results.
//! - All errors map to structured HTTP responses via [`AppError`].
//! - Acting parties arrive in request bodies; session/token mechanics
//!   are a collaborator in front of this service.

pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::{AppConfig, AppState};

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Assemble the full application router.
///
/// Health probes are mounted outside the API stack so they stay
/// reachable regardless of state.
pub fn app(state: AppState) -> Router {
    // Body size limit: 1 MiB. Provider events and booking bodies are
    // small; anything larger is hostile.
    let api = Router::new()
        .merge(routes::jobs::router())
        .merge(routes::bookings::router())
        .merge(routes::webhooks::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(api)
}

/// GET /health/liveness — process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// GET /health/readiness — ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
