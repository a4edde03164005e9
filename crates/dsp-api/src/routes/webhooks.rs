//! # Payment Webhook Route
//!
//! - `POST /v1/webhooks/payments` — provider event intake
//!
//! The raw body is passed to the processor untouched: signature
//! verification runs over the exact bytes the provider signed. The only
//! non-2xx outcome is an invalid signature (401); duplicates, unroutable
//! events, and handler failures are acknowledged so the provider stops
//! redelivering.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};

use dsp_payments::WebhookAck;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the provider signature (`t=...,v1=...`).
pub const SIGNATURE_HEADER: &str = "webhook-signature";

/// Build the webhooks router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/webhooks/payments", post(receive_payment_event))
}

/// POST /v1/webhooks/payments — receive one provider event.
#[utoipa::path(
    post,
    path = "/v1/webhooks/payments",
    responses(
        (status = 200, description = "Event acknowledged (processed, duplicate, or ignored)"),
        (status = 401, description = "Signature verification failed", body = crate::error::ErrorBody),
    ),
    tag = "webhooks"
)]
pub async fn receive_payment_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let ack = state.processor.process(&body, signature)?;
    Ok(Json(ack))
}
