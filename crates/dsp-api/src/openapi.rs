//! # OpenAPI Generation
//!
//! Aggregates the handler annotations into an OpenAPI 3 document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// The API document.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::jobs::create_job,
        crate::routes::jobs::get_job,
        crate::routes::jobs::job_bookings,
        crate::routes::bookings::apply_to_job,
        crate::routes::bookings::get_booking,
        crate::routes::bookings::accept_candidate,
        crate::routes::bookings::start_work,
        crate::routes::bookings::mark_delivered,
        crate::routes::bookings::validate_completion,
        crate::routes::bookings::cancel_booking,
        crate::routes::bookings::report_no_show,
        crate::routes::bookings::confirm_no_show,
        crate::routes::bookings::open_dispute,
        crate::routes::bookings::resolve_dispute,
        crate::routes::webhooks::receive_payment_event,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::MoneyBody,
        crate::routes::ActingParty,
        crate::routes::JobResponse,
        crate::routes::TransferBody,
        crate::routes::BookingResponse,
        crate::routes::jobs::CreateJobRequest,
        crate::routes::bookings::ApplyRequest,
        crate::routes::bookings::AcceptRequest,
        crate::routes::bookings::StartRequest,
        crate::routes::bookings::DeliverRequest,
        crate::routes::bookings::ValidateCompletionRequest,
        crate::routes::bookings::CancelRequest,
        crate::routes::bookings::NoShowReportRequest,
        crate::routes::bookings::NoShowConfirmRequest,
        crate::routes::bookings::DisputeOpenRequest,
        crate::routes::bookings::DisputeResolveRequest,
        crate::routes::bookings::SanctionBody,
        crate::routes::bookings::NoShowResolutionResponse,
        crate::routes::bookings::DisputeResolutionResponse,
    )),
    tags(
        (name = "jobs", description = "Job publication and reads"),
        (name = "bookings", description = "Booking lifecycle operations"),
        (name = "incidents", description = "No-show and dispute handling"),
        (name = "webhooks", description = "Payment provider event intake"),
    ),
    info(
        title = "Dispatch Stack API",
        description = "Booking lifecycle and payment reconciliation engine."
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(spec))
}

/// GET /openapi.json — the generated document.
async fn spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
