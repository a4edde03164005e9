//! # Booking Routes
//!
//! The booking lifecycle, the no-show flow, and dispute handling.
//!
//! - `POST /v1/jobs/:id/apply` — driver applies
//! - `GET  /v1/bookings/:id` — booking details
//! - `POST /v1/bookings/:id/accept` — company accepts the candidate
//! - `POST /v1/bookings/:id/start` — driver starts work
//! - `POST /v1/bookings/:id/deliver` — driver marks delivery
//! - `POST /v1/bookings/:id/validate` — company validates completion
//! - `POST /v1/bookings/:id/cancel` — company/admin cancels
//! - `POST /v1/bookings/:id/no-show` — company reports a no-show
//! - `POST /v1/bookings/:id/no-show/confirm` — admin/driver resolves it
//! - `POST /v1/bookings/:id/dispute` — company contests the delivery
//! - `POST /v1/bookings/:id/dispute/resolve` — admin resolves the dispute

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use dsp_arbitration::Sanction;
use dsp_core::{Actor, AdminId, BookingId, CompanyId, DriverId, JobId, Money};
use dsp_lifecycle::DisputeAction;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::{ActingParty, BookingResponse, MoneyBody};
use crate::state::AppState;

// ─── Request Bodies ──────────────────────────────────────────────────

/// Request to apply to a job.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ApplyRequest {
    /// The applying driver.
    pub driver_id: Uuid,
}

impl Validate for ApplyRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Request to accept a candidate.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AcceptRequest {
    /// The acting company (must own the job).
    pub company_id: Uuid,
}

impl Validate for AcceptRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Request for a driver-side transition (start).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct StartRequest {
    /// The acting driver (must be the booking's driver).
    pub driver_id: Uuid,
}

impl Validate for StartRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Request to mark a delivery performed.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct DeliverRequest {
    /// The acting driver (must be the booking's driver).
    pub driver_id: Uuid,
    /// Proof-of-delivery reference.
    pub proof_of_delivery: Option<String>,
}

impl Validate for DeliverRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Request to validate completion.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ValidateCompletionRequest {
    /// The acting party: the owning company or an administrator.
    pub acting: ActingParty,
}

impl Validate for ValidateCompletionRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Request to cancel a booking.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CancelRequest {
    /// The acting party: the owning company or an administrator.
    pub acting: ActingParty,
    /// Why the booking is cancelled.
    pub reason: String,
}

impl Validate for CancelRequest {
    fn validate(&self) -> Result<(), String> {
        if self.reason.trim().is_empty() {
            return Err("reason must be non-empty".into());
        }
        Ok(())
    }
}

/// Request to report a no-show.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NoShowReportRequest {
    /// The reporting company (must own the job).
    pub company_id: Uuid,
    /// Why the driver is considered a no-show.
    pub reason: String,
}

impl Validate for NoShowReportRequest {
    fn validate(&self) -> Result<(), String> {
        if self.reason.trim().is_empty() {
            return Err("reason must be non-empty".into());
        }
        Ok(())
    }
}

/// Request to resolve a no-show report.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NoShowConfirmRequest {
    /// The resolving party: an administrator, or the driver admitting
    /// fault.
    pub acting: ActingParty,
    /// Confirm (true) or dismiss (false).
    pub confirmed: bool,
    /// Free-text comment.
    pub comment: Option<String>,
}

impl Validate for NoShowConfirmRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Request to contest a delivery.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct DisputeOpenRequest {
    /// The contesting party: the owning company or an administrator.
    pub acting: ActingParty,
    /// Why the delivery is contested.
    pub reason: String,
}

impl Validate for DisputeOpenRequest {
    fn validate(&self) -> Result<(), String> {
        if self.reason.trim().is_empty() {
            return Err("reason must be non-empty".into());
        }
        Ok(())
    }
}

/// Request to resolve a dispute.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct DisputeResolveRequest {
    /// The resolving administrator.
    pub admin_id: Uuid,
    /// Resolution action: `validate`, `cancel`, or `partial_refund`.
    pub action: String,
    /// Refund amount in minor units, for `partial_refund`.
    pub refund_minor: Option<i64>,
    /// Refund currency, for `partial_refund`.
    pub currency: Option<String>,
    /// Decision notes, recorded immutably on the booking.
    pub notes: String,
}

impl Validate for DisputeResolveRequest {
    fn validate(&self) -> Result<(), String> {
        match self.action.as_str() {
            "validate" | "cancel" => Ok(()),
            "partial_refund" => {
                if self.refund_minor.is_none() || self.currency.is_none() {
                    Err("partial_refund requires refund_minor and currency".into())
                } else {
                    Ok(())
                }
            }
            other => Err(format!(
                "unknown action {other:?}; expected validate, cancel, or partial_refund"
            )),
        }
    }
}

impl DisputeResolveRequest {
    fn dispute_action(&self) -> Result<DisputeAction, AppError> {
        match self.action.as_str() {
            "validate" => Ok(DisputeAction::Validate),
            "cancel" => Ok(DisputeAction::Cancel),
            "partial_refund" => {
                // Presence validated in Validate::validate.
                let minor = self.refund_minor.unwrap_or_default();
                let currency = self.currency.clone().unwrap_or_default();
                let refund = Money::new(minor, currency)
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                Ok(DisputeAction::PartialRefund { refund })
            }
            other => Err(AppError::Validation(format!("unknown action {other:?}"))),
        }
    }
}

// ─── Response Bodies ─────────────────────────────────────────────────

/// Sanction applied to a driver, on the wire.
#[derive(Debug, Serialize, ToSchema)]
pub struct SanctionBody {
    /// Sanction kind: `warning`, `suspension`, or `permanent_ban`.
    pub kind: String,
    /// Suspension end (ISO8601, UTC), for suspensions.
    pub suspended_until: Option<String>,
}

impl From<&Sanction> for SanctionBody {
    fn from(sanction: &Sanction) -> Self {
        match sanction {
            Sanction::Warning => Self {
                kind: "warning".into(),
                suspended_until: None,
            },
            Sanction::Suspension { until } => Self {
                kind: "suspension".into(),
                suspended_until: Some(until.to_iso8601()),
            },
            Sanction::PermanentBan => Self {
                kind: "permanent_ban".into(),
                suspended_until: None,
            },
        }
    }
}

/// Outcome of a no-show resolution.
#[derive(Debug, Serialize, ToSchema)]
pub struct NoShowResolutionResponse {
    /// The booking after resolution.
    pub booking: BookingResponse,
    /// Whether the no-show was confirmed.
    pub confirmed: bool,
    /// The applied sanction, if confirmed.
    pub sanction: Option<SanctionBody>,
}

/// Outcome of a dispute resolution.
#[derive(Debug, Serialize, ToSchema)]
pub struct DisputeResolutionResponse {
    /// The booking after resolution.
    pub booking: BookingResponse,
    /// Amount due to the driver, if the resolution pays out.
    pub transfer_due: Option<MoneyBody>,
}

// ─── Router ──────────────────────────────────────────────────────────

/// Build the bookings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/jobs/:id/apply", post(apply_to_job))
        .route("/v1/bookings/:id", get(get_booking))
        .route("/v1/bookings/:id/accept", post(accept_candidate))
        .route("/v1/bookings/:id/start", post(start_work))
        .route("/v1/bookings/:id/deliver", post(mark_delivered))
        .route("/v1/bookings/:id/validate", post(validate_completion))
        .route("/v1/bookings/:id/cancel", post(cancel_booking))
        .route("/v1/bookings/:id/no-show", post(report_no_show))
        .route("/v1/bookings/:id/no-show/confirm", post(confirm_no_show))
        .route("/v1/bookings/:id/dispute", post(open_dispute))
        .route("/v1/bookings/:id/dispute/resolve", post(resolve_dispute))
}

// ─── Handlers ────────────────────────────────────────────────────────

/// POST /v1/jobs/:id/apply — driver applies to a job.
#[utoipa::path(
    post,
    path = "/v1/jobs/{id}/apply",
    params(("id" = Uuid, Path, description = "Job id")),
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 403, description = "Driver ineligible or plan limit reached", body = crate::error::ErrorBody),
        (status = 409, description = "Duplicate application or job not open", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub async fn apply_to_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<ApplyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let booking = state
        .engine
        .apply_to_job(JobId::from_uuid(id), DriverId::from_uuid(req.driver_id))?;
    Ok((StatusCode::CREATED, Json(BookingResponse::from(&booking))))
}

/// GET /v1/bookings/:id — booking details.
#[utoipa::path(
    get,
    path = "/v1/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking details", body = BookingResponse),
        (status = 404, description = "Booking not found", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.engine.booking(&BookingId::from_uuid(id))?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// POST /v1/bookings/:id/accept — company accepts the candidate.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/accept",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = AcceptRequest,
    responses(
        (status = 200, description = "Candidate accepted", body = BookingResponse),
        (status = 403, description = "Not the owning company", body = crate::error::ErrorBody),
        (status = 409, description = "Booking not pending or job taken", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub async fn accept_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<AcceptRequest>, JsonRejection>,
) -> Result<Json<BookingResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let booking = state.engine.accept_candidate(
        BookingId::from_uuid(id),
        Actor::Company(CompanyId::from_uuid(req.company_id)),
    )?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// POST /v1/bookings/:id/start — driver starts work.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/start",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = StartRequest,
    responses(
        (status = 200, description = "Work started", body = BookingResponse),
        (status = 409, description = "Booking not assigned", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub async fn start_work(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<BookingResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let booking = state.engine.start_work(
        BookingId::from_uuid(id),
        Actor::Driver(DriverId::from_uuid(req.driver_id)),
    )?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// POST /v1/bookings/:id/deliver — driver marks delivery.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/deliver",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = DeliverRequest,
    responses(
        (status = 200, description = "Delivery recorded", body = BookingResponse),
        (status = 409, description = "Booking not in a deliverable state", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub async fn mark_delivered(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<DeliverRequest>, JsonRejection>,
) -> Result<Json<BookingResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let booking = state.engine.mark_delivered(
        BookingId::from_uuid(id),
        Actor::Driver(DriverId::from_uuid(req.driver_id)),
        req.proof_of_delivery,
    )?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// POST /v1/bookings/:id/validate — company validates completion.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/validate",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = ValidateCompletionRequest,
    responses(
        (status = 200, description = "Completion validated; transfer initiated", body = BookingResponse),
        (status = 409, description = "Not delivered, disputed, or unpaid", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub async fn validate_completion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<ValidateCompletionRequest>, JsonRejection>,
) -> Result<Json<BookingResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let booking = state
        .engine
        .validate_completion(BookingId::from_uuid(id), req.acting.actor()?)?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// POST /v1/bookings/:id/cancel — company or admin cancels.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 409, description = "Booking already terminal", body = crate::error::ErrorBody),
    ),
    tag = "bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<CancelRequest>, JsonRejection>,
) -> Result<Json<BookingResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let booking = state.engine.cancel_booking(
        BookingId::from_uuid(id),
        req.acting.actor()?,
        req.reason,
    )?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// POST /v1/bookings/:id/no-show — company reports a no-show.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/no-show",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = NoShowReportRequest,
    responses(
        (status = 200, description = "No-show reported", body = BookingResponse),
        (status = 409, description = "Unresolved report exists or booking not accepted", body = crate::error::ErrorBody),
    ),
    tag = "incidents"
)]
pub async fn report_no_show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<NoShowReportRequest>, JsonRejection>,
) -> Result<Json<BookingResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let booking = state.engine.report_no_show(
        BookingId::from_uuid(id),
        Actor::Company(CompanyId::from_uuid(req.company_id)),
        req.reason,
    )?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// POST /v1/bookings/:id/no-show/confirm — resolve a no-show report.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/no-show/confirm",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = NoShowConfirmRequest,
    responses(
        (status = 200, description = "Report resolved", body = NoShowResolutionResponse),
        (status = 403, description = "Party may not resolve this report", body = crate::error::ErrorBody),
        (status = 409, description = "No report, or already resolved", body = crate::error::ErrorBody),
    ),
    tag = "incidents"
)]
pub async fn confirm_no_show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<NoShowConfirmRequest>, JsonRejection>,
) -> Result<Json<NoShowResolutionResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let (booking, sanction) = state.engine.confirm_no_show(
        BookingId::from_uuid(id),
        req.acting.actor()?,
        req.confirmed,
        req.comment,
    )?;
    Ok(Json(NoShowResolutionResponse {
        booking: BookingResponse::from(&booking),
        confirmed: sanction.is_some(),
        sanction: sanction.as_ref().map(SanctionBody::from),
    }))
}

/// POST /v1/bookings/:id/dispute — contest a delivered booking.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/dispute",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = DisputeOpenRequest,
    responses(
        (status = 200, description = "Dispute opened", body = BookingResponse),
        (status = 409, description = "Not delivered, or already disputed", body = crate::error::ErrorBody),
    ),
    tag = "incidents"
)]
pub async fn open_dispute(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<DisputeOpenRequest>, JsonRejection>,
) -> Result<Json<BookingResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let booking = state.engine.open_dispute(
        BookingId::from_uuid(id),
        req.acting.actor()?,
        req.reason,
    )?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// POST /v1/bookings/:id/dispute/resolve — admin resolves a dispute.
#[utoipa::path(
    post,
    path = "/v1/bookings/{id}/dispute/resolve",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = DisputeResolveRequest,
    responses(
        (status = 200, description = "Dispute resolved", body = DisputeResolutionResponse),
        (status = 409, description = "Not disputed, or already resolved", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid action or refund amount", body = crate::error::ErrorBody),
    ),
    tag = "incidents"
)]
pub async fn resolve_dispute(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<DisputeResolveRequest>, JsonRejection>,
) -> Result<Json<DisputeResolutionResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let action = req.dispute_action()?;
    let (booking, outcome) = state.engine.resolve_dispute(
        BookingId::from_uuid(id),
        AdminId::from_uuid(req.admin_id),
        action,
        req.notes,
    )?;
    Ok(Json(DisputeResolutionResponse {
        booking: BookingResponse::from(&booking),
        transfer_due: outcome.transfer_due.as_ref().map(MoneyBody::from),
    }))
}
