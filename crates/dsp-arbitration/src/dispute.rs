//! # Dispute Resolution
//!
//! An administrator resolves a contested delivery with one of three
//! actions: validate (pay the driver), cancel (refund the company), or
//! partial refund (split). The booking records the decision immutably;
//! this module additionally mirrors the job and computes the amount due
//! to the driver so the caller can initiate the transfer.
//!
//! The resolver never talks to the payment provider — it reports what is
//! due, and the engine initiates the transfer under the booking's
//! at-most-once transfer marker.

use serde::Serialize;

use dsp_core::{AdminId, Money};
use dsp_lifecycle::{Booking, DisputeAction, Job};

use crate::error::ArbitrationError;

/// Outcome of a dispute resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisputeOutcome {
    /// The applied action.
    pub action: DisputeAction,
    /// Amount due to the driver, if the resolution pays out.
    pub transfer_due: Option<Money>,
}

/// Apply an administrator's resolution to a disputed booking.
///
/// Fails unless the booking is currently disputed; a second resolution
/// attempt is a conflict and leaves the first outcome intact. For
/// `PartialRefund` the refund must not exceed the agreed price.
///
/// Must run inside the store's atomic updates for booking and job.
pub fn resolve_dispute(
    booking: &mut Booking,
    job: &mut Job,
    admin: AdminId,
    action: DisputeAction,
    notes: impl Into<String>,
) -> Result<DisputeOutcome, ArbitrationError> {
    // Compute the payout before mutating so an invalid refund amount
    // rejects the request without touching the booking.
    let transfer_due = match &action {
        DisputeAction::Validate => Some(booking.agreed_price.clone()),
        DisputeAction::Cancel => None,
        DisputeAction::PartialRefund { refund } => Some(
            booking
                .agreed_price
                .checked_sub(refund)
                .map_err(ArbitrationError::InvalidRefund)?,
        ),
    };

    booking.resolve_dispute(admin, action.clone(), notes)?;
    job.mirror_booking(booking.status);

    tracing::info!(
        booking = %booking.id,
        job = %job.id,
        status = %booking.status,
        settlement = %booking.settlement,
        "dispute resolved"
    );

    Ok(DisputeOutcome {
        action,
        transfer_due,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsp_core::{Actor, CompanyId, DriverId, ProviderPaymentId};
    use dsp_lifecycle::{BookingStatus, JobStatus, SettlementStatus};

    fn disputed_pair() -> (Job, Booking) {
        let mut job = Job::new(
            CompanyId::new(),
            "Contested run",
            Money::new(30_000, "EUR").unwrap(),
            false,
            None,
        );
        let mut booking = Booking::new(job.id, DriverId::new(), Money::new(30_000, "EUR").unwrap());
        let company = Actor::Company(job.company_id);
        booking.accept(&company, &job).unwrap();
        booking
            .record_payment_captured(ProviderPaymentId::new("pi_9"), "succeeded")
            .unwrap();
        booking
            .mark_delivered(&Actor::Driver(booking.driver_id), None)
            .unwrap();
        booking
            .open_dispute(&company, &job, "cargo missing")
            .unwrap();
        job.mirror_booking(booking.status);
        (job, booking)
    }

    #[test]
    fn test_validate_pays_full_price() {
        let (mut job, mut booking) = disputed_pair();
        let outcome = resolve_dispute(
            &mut booking,
            &mut job,
            AdminId::new(),
            DisputeAction::Validate,
            "delivery proven",
        )
        .unwrap();
        assert_eq!(outcome.transfer_due.unwrap().minor, 30_000);
        assert_eq!(booking.status, BookingStatus::Completed);
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_cancel_refunds_company() {
        let (mut job, mut booking) = disputed_pair();
        let outcome = resolve_dispute(
            &mut booking,
            &mut job,
            AdminId::new(),
            DisputeAction::Cancel,
            "no proof of delivery",
        )
        .unwrap();
        assert_eq!(outcome.transfer_due, None);
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.settlement, SettlementStatus::Refunded);
        assert_eq!(job.status, JobStatus::Cancelled);
    }

    #[test]
    fn test_partial_refund_splits_amount() {
        let (mut job, mut booking) = disputed_pair();
        let outcome = resolve_dispute(
            &mut booking,
            &mut job,
            AdminId::new(),
            DisputeAction::PartialRefund {
                refund: Money::new(12_000, "EUR").unwrap(),
            },
            "partial damage",
        )
        .unwrap();
        assert_eq!(outcome.transfer_due.unwrap().minor, 18_000);
        assert_eq!(booking.settlement, SettlementStatus::PartiallyRefunded);
    }

    #[test]
    fn test_refund_exceeding_price_rejected_without_mutation() {
        let (mut job, mut booking) = disputed_pair();
        let result = resolve_dispute(
            &mut booking,
            &mut job,
            AdminId::new(),
            DisputeAction::PartialRefund {
                refund: Money::new(99_000, "EUR").unwrap(),
            },
            "oversized refund",
        );
        assert!(matches!(result, Err(ArbitrationError::InvalidRefund(_))));
        // Booking untouched, still disputed.
        assert_eq!(booking.settlement, SettlementStatus::Disputed);
        assert_eq!(booking.status, BookingStatus::Delivered);
    }

    #[test]
    fn test_second_resolution_is_conflict() {
        let (mut job, mut booking) = disputed_pair();
        resolve_dispute(
            &mut booking,
            &mut job,
            AdminId::new(),
            DisputeAction::Validate,
            "ok",
        )
        .unwrap();
        let result = resolve_dispute(
            &mut booking,
            &mut job,
            AdminId::new(),
            DisputeAction::Cancel,
            "flip-flop",
        );
        assert!(result.is_err());
        assert_eq!(booking.status, BookingStatus::Completed);
    }
}
