//! # Fund Transfer Seam
//!
//! The outbound transfer to the driver's payout account sits behind
//! [`TransferClient`]. The HTTP implementation belongs to the
//! deployment; the engine only needs the outcome, and a timed-out call
//! is reported as [`TransferOutcome::Pending`] — the money may have
//! moved, so it must be reconciled, never retried inline.
//!
//! [`ensure_transfer`] is the single at-most-once entry point: it checks
//! the booking's transfer marker and the driver's payout eligibility
//! before touching the client, and records whatever outcome the client
//! returns in the same atomic booking update the caller holds open.

use std::sync::Mutex;

use dsp_core::{BookingId, DriverId, Money, Timestamp};
use dsp_lifecycle::{Booking, DriverProfile, LifecycleError, TransferRecord, TransferStatus};

/// A transfer order for the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    /// The booking being paid out.
    pub booking_id: BookingId,
    /// The receiving driver.
    pub driver_id: DriverId,
    /// Amount to transfer.
    pub amount: Money,
}

/// Outcome of a transfer call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    /// Provider confirmed the transfer.
    Completed {
        /// Provider-assigned transfer id.
        provider_transfer_id: String,
    },
    /// The call timed out or returned an indeterminate answer. The
    /// transfer may or may not have happened — reconciliation required.
    Pending,
    /// Provider rejected the transfer.
    Failed {
        /// Provider error message.
        error: String,
    },
}

/// Client for the provider's transfer API.
///
/// Implementations must bound the call with a timeout and map a timeout
/// to [`TransferOutcome::Pending`].
pub trait TransferClient: Send + Sync {
    /// Submit a transfer order.
    fn create_transfer(&self, request: &TransferRequest) -> TransferOutcome;
}

/// What [`ensure_transfer`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferDecision {
    /// A transfer record already exists; nothing was submitted.
    AlreadyInitiated,
    /// The driver's payout account is not verified; nothing was
    /// submitted. Surfaces in logs for reconciliation.
    DriverNotEligible,
    /// A transfer was submitted and its outcome recorded.
    Recorded(TransferStatus),
}

/// Initiate the booking's single fund transfer, if it has not happened
/// and the driver is payout-eligible.
///
/// Must run inside the caller's atomic booking update so the marker
/// check and the record write cannot race with a concurrent initiation.
pub fn ensure_transfer(
    booking: &mut Booking,
    driver: &DriverProfile,
    client: &dyn TransferClient,
    amount: Money,
) -> Result<TransferDecision, LifecycleError> {
    if booking.transfer_initiated() {
        return Ok(TransferDecision::AlreadyInitiated);
    }
    if !driver.payout_eligible {
        tracing::warn!(
            booking = %booking.id,
            driver = %driver.id,
            "transfer due but driver payout account is not verified"
        );
        return Ok(TransferDecision::DriverNotEligible);
    }

    let request = TransferRequest {
        booking_id: booking.id,
        driver_id: driver.id,
        amount: amount.clone(),
    };
    let outcome = client.create_transfer(&request);

    let (status, provider_transfer_id, error) = match outcome {
        TransferOutcome::Completed {
            provider_transfer_id,
        } => (TransferStatus::Completed, Some(provider_transfer_id), None),
        TransferOutcome::Pending => (TransferStatus::Pending, None, None),
        TransferOutcome::Failed { error } => (TransferStatus::Failed, None, Some(error)),
    };

    booking.record_transfer(TransferRecord {
        provider_transfer_id,
        amount,
        status,
        initiated_at: Timestamp::now(),
        error,
    })?;

    metrics::counter!("transfers_initiated_total").increment(1);
    tracing::info!(
        booking = %booking.id,
        driver = %driver.id,
        status = %status,
        "fund transfer recorded"
    );
    Ok(TransferDecision::Recorded(status))
}

// ─── Reference Clients ───────────────────────────────────────────────

/// Always-succeeding client for local development.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantTransferClient;

impl TransferClient for InstantTransferClient {
    fn create_transfer(&self, _request: &TransferRequest) -> TransferOutcome {
        TransferOutcome::Completed {
            provider_transfer_id: format!("tr_{}", uuid::Uuid::new_v4().simple()),
        }
    }
}

/// Test double that records every request and returns a configured
/// outcome.
pub struct RecordingTransferClient {
    outcome: TransferOutcome,
    requests: Mutex<Vec<TransferRequest>>,
}

impl RecordingTransferClient {
    /// A client that answers every request with `outcome`.
    pub fn returning(outcome: TransferOutcome) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// The requests submitted so far.
    pub fn requests(&self) -> Vec<TransferRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl TransferClient for RecordingTransferClient {
    fn create_transfer(&self, request: &TransferRequest) -> TransferOutcome {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.outcome.clone()
    }
}
