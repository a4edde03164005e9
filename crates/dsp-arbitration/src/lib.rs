//! # dsp-arbitration — Incident Resolution
//!
//! Couples the booking lifecycle's incident markers to their
//! consequences:
//!
//! - **Sanction** ([`sanction`]): the deterministic escalation ladder
//!   for confirmed driver no-shows — warning, 7-day suspension,
//!   permanent ban.
//!
//! - **No-show** ([`noshow`]): report and confirmation flow. A confirmed
//!   incident cancels the booking, mirrors the job, and applies exactly
//!   one sanction; the booking's resolution marker guarantees single
//!   application.
//!
//! - **Dispute** ([`dispute`]): administrator resolution of contested
//!   deliveries, producing the terminal booking/job pair plus the amount
//!   (if any) due to the driver.
//!
//! ## Crate Policy
//!
//! Functions here operate on entities already loaded by the caller and
//! must run inside the store's atomic updates. They never talk to
//! storage or to the payment provider themselves.

pub mod dispute;
pub mod error;
pub mod noshow;
pub mod sanction;

pub use dispute::{resolve_dispute, DisputeOutcome};
pub use error::ArbitrationError;
pub use noshow::{confirm_no_show, report_no_show};
pub use sanction::{Sanction, SanctionEngine, SUSPENSION_DAYS};
