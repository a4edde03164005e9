//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from the engine and the webhook processor to HTTP
//! status codes with JSON error bodies. Internal error details are
//! never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use dsp_engine::EngineError;
use dsp_lifecycle::LifecycleError;
use dsp_payments::PaymentError;
use dsp_store::StoreError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// The error detail.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (422).
    ///
    /// Normalized with `Validation` to 422 Unprocessable Entity: the
    /// client sent syntactically valid HTTP but semantically invalid
    /// content. Only malformed HTTP framing is 400.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure — e.g. an invalid webhook signature (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure — wrong role or ownership (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with the current resource state (409). The message
    /// carries the authoritative state so callers can resynchronize.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Map engine errors onto the HTTP taxonomy.
impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => Self::Validation(msg),
            // Quota denials carry the limit and the upgrade hint.
            EngineError::Quota(e) => Self::Forbidden(e.to_string()),
            EngineError::Lifecycle(e) => lifecycle_to_app(e),
            EngineError::Arbitration(e) => match e {
                dsp_arbitration::ArbitrationError::Lifecycle(inner) => lifecycle_to_app(inner),
                dsp_arbitration::ArbitrationError::InvalidRefund(inner) => {
                    Self::Validation(inner.to_string())
                }
            },
            EngineError::Store(e) => match e {
                StoreError::NotFound { .. } => Self::NotFound(e.to_string()),
                StoreError::DuplicateBooking { .. } | StoreError::DuplicateEvent(_) => {
                    Self::Conflict(e.to_string())
                }
            },
            EngineError::DriverUnavailable { .. } => Self::Forbidden(err.to_string()),
            EngineError::JobNotOpen { .. } => Self::Conflict(err.to_string()),
        }
    }
}

fn lifecycle_to_app(err: LifecycleError) -> AppError {
    match err {
        LifecycleError::Forbidden { .. } => AppError::Forbidden(err.to_string()),
        // Every other lifecycle rejection is a state conflict; the
        // message carries the current status.
        other => AppError::Conflict(other.to_string()),
    }
}

/// Map payment errors onto the HTTP taxonomy. Only signature failures
/// reject a webhook delivery; everything else is acknowledged upstream.
impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::SignatureInvalid(msg) => Self::Unauthorized(msg),
            PaymentError::MalformedPayload(msg) => Self::BadRequest(msg),
            PaymentError::Store(e) => match e {
                StoreError::NotFound { .. } => Self::NotFound(e.to_string()),
                other => Self::Conflict(other.to_string()),
            },
            PaymentError::Lifecycle(e) => lifecycle_to_app(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsp_core::{AdminId, Money};
    use dsp_lifecycle::BookingStatus;
    use dsp_quota::{QuotaError, UsageAction};

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                AppError::Validation("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::BadRequest("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let (status, _) = err.status_and_code();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_quota_denial_maps_to_forbidden() {
        let err = EngineError::Quota(QuotaError::LimitReached {
            action: UsageAction::PublishJob,
            limit: 1,
            used: 1,
        });
        let app: AppError = err.into();
        let (status, _) = app.status_and_code();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(app.to_string().contains("upgrade"));
    }

    #[test]
    fn test_lifecycle_conflict_carries_status() {
        let err = EngineError::Lifecycle(LifecycleError::AlreadyTerminal {
            status: BookingStatus::Completed,
        });
        let app: AppError = err.into();
        let (status, code) = app.status_and_code();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "CONFLICT");
        assert!(app.to_string().contains("COMPLETED"));
    }

    #[test]
    fn test_lifecycle_forbidden_maps_to_403() {
        let err = EngineError::Lifecycle(LifecycleError::Forbidden {
            actor: AdminId::new().to_string(),
            action: "do a thing".into(),
        });
        let app: AppError = err.into();
        let (status, _) = app.status_and_code();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_signature_failure_maps_to_401() {
        let err = PaymentError::SignatureInvalid("mismatch".into());
        let app: AppError = err.into();
        let (status, _) = app.status_and_code();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_not_found_store_error() {
        let err = EngineError::Store(StoreError::NotFound {
            entity: "booking",
            id: "booking:123".into(),
        });
        let app: AppError = err.into();
        let (status, _) = app.status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_refund_maps_to_validation() {
        let price = Money::new(100, "EUR").unwrap();
        let refund = Money::new(200, "EUR").unwrap();
        let core_err = price.checked_sub(&refund).unwrap_err();
        let err = EngineError::Arbitration(dsp_arbitration::ArbitrationError::InvalidRefund(
            core_err,
        ));
        let app: AppError = err.into();
        let (status, _) = app.status_and_code();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    // ── into_response tests ──────────────────────────────────────────

    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_into_response_conflict() {
        let (status, body) = response_parts(AppError::Conflict("booking is ASSIGNED".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error.code, "CONFLICT");
        assert!(body.error.message.contains("ASSIGNED"));
    }

    #[tokio::test]
    async fn test_into_response_internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("store exploded".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.error.message.contains("store exploded"));
        assert_eq!(body.error.message, "An internal error occurred");
    }
}
