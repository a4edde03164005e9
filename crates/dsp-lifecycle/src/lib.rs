//! # dsp-lifecycle — Booking & Job State Machines
//!
//! Implements the central state machines of the Dispatch Stack using
//! validated enums with guarded transition methods. Every mutation of a
//! booking or job flows through this crate; callers (the engine, the
//! webhook processor, the dispute resolver) never assign a status field
//! directly.
//!
//! ## State Machines
//!
//! - **Booking** ([`booking`]): `Pending → Assigned → InProgress →
//!   Delivered → Completed`, with `Cancelled` reachable from every
//!   non-terminal state, a parallel settlement axis, and typed markers
//!   for transfers, no-show incidents, and disputes.
//!
//! - **Job** ([`job`]): a write-through projection of the accepted
//!   booking's progress. When no booking is accepted the job stays
//!   `Open`; afterwards it mirrors the booking inside the same atomic
//!   store update, so the two can never drift.
//!
//! - **DriverProfile** ([`driver`]): the driver's operating record —
//!   availability, payout eligibility, delivery count, and the typed
//!   sanction state (strike count, suspension window, ban flag).
//!
//! ## Design
//!
//! Validated enums (runtime-checked transitions returning `Result`) are
//! used rather than typestate. Cancellation is reachable from four
//! source states and bookings are persisted and transmitted with the
//! state unknown at compile time; typestate would multiply `impl` blocks
//! without proportional safety benefit. Invalid transitions are rejected
//! with structured errors carrying the current state so callers can
//! resynchronize.

pub mod booking;
pub mod driver;
pub mod error;
pub mod job;

// ─── Booking re-exports ─────────────────────────────────────────────

pub use booking::{
    Booking, BookingStatus, BookingTransitionRecord, DisputeAction, DisputeDecision,
    DisputeRecord, NoShowRecord, NoShowResolution, SettlementStatus, TransferRecord,
    TransferStatus,
};

// ─── Job re-exports ─────────────────────────────────────────────────

pub use job::{Job, JobStatus};

// ─── Driver re-exports ──────────────────────────────────────────────

pub use driver::DriverProfile;

// ─── Error re-exports ───────────────────────────────────────────────

pub use error::LifecycleError;
