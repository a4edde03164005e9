//! # Lifecycle Error Types
//!
//! Structured errors for booking/job state transitions. Every rejection
//! carries the current persisted state so callers can resynchronize
//! their view instead of receiving a generic failure.

use thiserror::Error;

use crate::booking::{BookingStatus, SettlementStatus};

/// Errors raised by booking and job lifecycle transitions.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Attempted transition is not valid from the current status.
    #[error("invalid booking transition: {from} -> {to}: {reason}")]
    InvalidTransition {
        /// Current booking status.
        from: BookingStatus,
        /// Attempted target status.
        to: BookingStatus,
        /// Why the transition was rejected.
        reason: String,
    },

    /// Booking is in a terminal status and accepts no further transitions.
    #[error("booking is in terminal status {status}")]
    AlreadyTerminal {
        /// The terminal status.
        status: BookingStatus,
    },

    /// The acting party may not trigger this transition.
    #[error("actor {actor} may not {action}")]
    Forbidden {
        /// Display form of the acting party.
        actor: String,
        /// The attempted action.
        action: String,
    },

    /// The transition requires captured funds which are not present.
    #[error("payment not captured: settlement status is {settlement}")]
    PaymentNotCaptured {
        /// Current settlement status.
        settlement: SettlementStatus,
    },

    /// A dispute operation was attempted on a booking that is not disputed.
    #[error("booking is not disputed: settlement status is {settlement}")]
    NotDisputed {
        /// Current settlement status.
        settlement: SettlementStatus,
    },

    /// The booking's delivery is already under dispute.
    #[error("booking is already disputed")]
    AlreadyDisputed,

    /// The dispute on this booking has already been resolved.
    #[error("dispute already resolved")]
    DisputeAlreadyResolved,

    /// No-show confirmation requires a prior report.
    #[error("no no-show has been reported for this booking")]
    NoShowNotReported,

    /// An unresolved no-show report already exists on this booking.
    #[error("an unresolved no-show report already exists")]
    NoShowAlreadyReported,

    /// The reported no-show has already been confirmed or dismissed.
    #[error("no-show report already resolved")]
    NoShowAlreadyResolved,

    /// A fund transfer has already been initiated for this booking.
    #[error("a fund transfer has already been initiated for this booking")]
    TransferAlreadyInitiated,

    /// The progress/settlement combination would be invalid.
    #[error("settlement status {settlement} is not valid while booking is {status}")]
    IncompatibleSettlement {
        /// Current booking status.
        status: BookingStatus,
        /// Rejected settlement status.
        settlement: SettlementStatus,
    },
}
