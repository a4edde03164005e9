//! # Job Routes
//!
//! - `POST /v1/jobs` — publish a job (quota-gated)
//! - `GET  /v1/jobs/:id` — job details
//! - `GET  /v1/jobs/:id/bookings` — the job's bookings, oldest first

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use dsp_core::{CompanyId, JobId, Money};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::{BookingResponse, JobResponse};
use crate::state::AppState;

/// Request to publish a job.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateJobRequest {
    /// The publishing company.
    pub company_id: Uuid,
    /// Job title.
    pub title: String,
    /// Day rate in minor currency units.
    pub day_rate_minor: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Urgency flag.
    #[serde(default)]
    pub urgent: bool,
    /// Urgency bonus in minor units, if urgent.
    pub urgency_bonus_minor: Option<i64>,
}

impl Validate for CreateJobRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must be non-empty".into());
        }
        if self.day_rate_minor < 0 {
            return Err("day_rate_minor must be non-negative".into());
        }
        if self.urgency_bonus_minor.is_some() && !self.urgent {
            return Err("urgency_bonus_minor requires urgent = true".into());
        }
        Ok(())
    }
}

/// Build the jobs router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/jobs", axum::routing::post(create_job))
        .route("/v1/jobs/:id", get(get_job))
        .route("/v1/jobs/:id/bookings", get(job_bookings))
}

/// POST /v1/jobs — publish a job.
#[utoipa::path(
    post,
    path = "/v1/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job published", body = JobResponse),
        (status = 403, description = "Plan limit reached", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
    ),
    tag = "jobs"
)]
pub async fn create_job(
    State(state): State<AppState>,
    body: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    let req = extract_validated_json(body)?;

    let day_rate = Money::new(req.day_rate_minor, req.currency.clone())
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let bonus = req
        .urgency_bonus_minor
        .map(|minor| Money::new(minor, req.currency.clone()))
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let job = state.engine.create_job(
        CompanyId::from_uuid(req.company_id),
        req.title,
        day_rate,
        req.urgent,
        bonus,
    )?;
    Ok((StatusCode::CREATED, Json(JobResponse::from(&job))))
}

/// GET /v1/jobs/:id — job details.
#[utoipa::path(
    get,
    path = "/v1/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job details", body = JobResponse),
        (status = 404, description = "Job not found", body = crate::error::ErrorBody),
    ),
    tag = "jobs"
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobResponse>, AppError> {
    let job = state.engine.job(&JobId::from_uuid(id))?;
    Ok(Json(JobResponse::from(&job)))
}

/// GET /v1/jobs/:id/bookings — the job's bookings.
#[utoipa::path(
    get,
    path = "/v1/jobs/{id}/bookings",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Bookings for the job", body = [BookingResponse]),
        (status = 404, description = "Job not found", body = crate::error::ErrorBody),
    ),
    tag = "jobs"
)]
pub async fn job_bookings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let job_id = JobId::from_uuid(id);
    // Existence check so an unknown job is 404, not an empty list.
    state.engine.job(&job_id)?;
    let bookings = state
        .engine
        .bookings_for_job(&job_id)
        .iter()
        .map(BookingResponse::from)
        .collect();
    Ok(Json(bookings))
}
