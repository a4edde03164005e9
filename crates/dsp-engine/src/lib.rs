//! # dsp-engine — The Operation Surface
//!
//! Every user-triggered operation of the Dispatch Stack enters through
//! [`BookingEngine`]: apply, accept, start, deliver, validate, cancel,
//! the no-show flow, and dispute handling. Webhook-driven mutations take
//! the parallel path through `dsp_payments::WebhookProcessor`; both
//! mutate entities only inside the store's atomic updates, so a user
//! action racing a webhook on the same booking serializes there and the
//! loser receives a conflict carrying the winner's status.
//!
//! ## Responsibilities
//!
//! - Consult the usage gate before creating jobs and bookings, and
//!   record usage after the grant.
//! - Run every booking transition together with the job's write-through
//!   projection in one atomic update.
//! - Couple confirmed no-shows to the sanction engine and resolved
//!   disputes to their payout, via `dsp-arbitration`.
//! - Initiate the at-most-once fund transfer at completion validation
//!   (or a dispute resolved in the driver's favor).
//!
//! ## Crate Policy
//!
//! No transport concerns. The API layer resolves callers to
//! [`dsp_core::Actor`] values and deserializes bodies; this crate owns
//! the semantics.

pub mod engine;
pub mod error;

pub use engine::BookingEngine;
pub use error::EngineError;
