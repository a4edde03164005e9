//! # Route Modules
//!
//! Each module defines an Axum router for one API surface area plus its
//! request/response DTOs. Shared DTOs (money, booking/job projections,
//! acting-party bodies) live here.

pub mod bookings;
pub mod jobs;
pub mod webhooks;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use dsp_core::{Actor, AdminId, CompanyId, DriverId, Money};
use dsp_lifecycle::{Booking, Job, TransferRecord};

use crate::error::AppError;

// ─── Shared DTOs ─────────────────────────────────────────────────────

/// A monetary amount on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MoneyBody {
    /// Amount in minor currency units.
    pub minor: i64,
    /// ISO 4217 currency code.
    pub currency: String,
}

impl From<&Money> for MoneyBody {
    fn from(money: &Money) -> Self {
        Self {
            minor: money.minor,
            currency: money.currency.clone(),
        }
    }
}

/// The acting party of a request, exactly one of the three roles.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ActingParty {
    /// Acting company id.
    pub company_id: Option<Uuid>,
    /// Acting driver id.
    pub driver_id: Option<Uuid>,
    /// Acting administrator id.
    pub admin_id: Option<Uuid>,
}

impl ActingParty {
    /// Resolve to an [`Actor`], requiring exactly one role to be set.
    pub fn actor(&self) -> Result<Actor, AppError> {
        match (self.company_id, self.driver_id, self.admin_id) {
            (Some(id), None, None) => Ok(Actor::Company(CompanyId::from_uuid(id))),
            (None, Some(id), None) => Ok(Actor::Driver(DriverId::from_uuid(id))),
            (None, None, Some(id)) => Ok(Actor::Admin(AdminId::from_uuid(id))),
            _ => Err(AppError::Validation(
                "exactly one of company_id, driver_id, admin_id must be set".to_string(),
            )),
        }
    }
}

/// A job on the wire.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobResponse {
    /// Job identifier.
    pub id: Uuid,
    /// Publishing company.
    pub company_id: Uuid,
    /// Current status (projection of the accepted booking).
    pub status: String,
    /// Job title.
    pub title: String,
    /// Day rate.
    pub day_rate: MoneyBody,
    /// Urgency flag.
    pub urgent: bool,
    /// Urgency bonus, if flagged.
    pub urgency_bonus: Option<MoneyBody>,
    /// Publication time (ISO8601, UTC).
    pub created_at: String,
}

impl From<&Job> for JobResponse {
    fn from(job: &Job) -> Self {
        Self {
            id: *job.id.as_uuid(),
            company_id: *job.company_id.as_uuid(),
            status: job.status.as_str().to_string(),
            title: job.title.clone(),
            day_rate: MoneyBody::from(&job.day_rate),
            urgent: job.urgent,
            urgency_bonus: job.urgency_bonus.as_ref().map(MoneyBody::from),
            created_at: job.created_at.to_iso8601(),
        }
    }
}

/// A fund-transfer record on the wire.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransferBody {
    /// Transfer outcome.
    pub status: String,
    /// Transferred amount.
    pub amount: MoneyBody,
    /// Provider transfer id, if returned.
    pub provider_transfer_id: Option<String>,
}

impl From<&TransferRecord> for TransferBody {
    fn from(record: &TransferRecord) -> Self {
        Self {
            status: record.status.to_string(),
            amount: MoneyBody::from(&record.amount),
            provider_transfer_id: record.provider_transfer_id.clone(),
        }
    }
}

/// A booking on the wire.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    /// Booking identifier.
    pub id: Uuid,
    /// The engaged job.
    pub job_id: Uuid,
    /// The applying driver.
    pub driver_id: Uuid,
    /// Progress status.
    pub status: String,
    /// Settlement status.
    pub settlement: String,
    /// Agreed price.
    pub agreed_price: MoneyBody,
    /// Provider payment id, once a payment exists.
    pub provider_payment_id: Option<String>,
    /// Proof-of-delivery reference.
    pub proof_of_delivery: Option<String>,
    /// The single fund transfer, once initiated.
    pub transfer: Option<TransferBody>,
    /// Application time (ISO8601, UTC).
    pub created_at: String,
    /// Capture time, if paid.
    pub paid_at: Option<String>,
    /// Delivery time, if delivered.
    pub delivered_at: Option<String>,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        Self {
            id: *booking.id.as_uuid(),
            job_id: *booking.job_id.as_uuid(),
            driver_id: *booking.driver_id.as_uuid(),
            status: booking.status.as_str().to_string(),
            settlement: booking.settlement.as_str().to_string(),
            agreed_price: MoneyBody::from(&booking.agreed_price),
            provider_payment_id: booking
                .provider_payment_id
                .as_ref()
                .map(|id| id.as_str().to_string()),
            proof_of_delivery: booking.proof_of_delivery.clone(),
            transfer: booking.transfer.as_ref().map(TransferBody::from),
            created_at: booking.created_at.to_iso8601(),
            paid_at: booking.paid_at.map(|t| t.to_iso8601()),
            delivered_at: booking.delivered_at.map(|t| t.to_iso8601()),
        }
    }
}
