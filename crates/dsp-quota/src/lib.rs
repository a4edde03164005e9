//! # dsp-quota — Usage/Limit Gate
//!
//! Enforces monthly plan-based limits on job publication and
//! application submission. Consulted *before* the engine creates the
//! corresponding job or booking; a successful creation is followed by an
//! increment of the matching counter.
//!
//! A user with no stored subscription is treated as being on the
//! implicit free tier with fixed limits. Counters reset only on
//! billing-period rollover, driven externally by subscription renewal.

pub mod gate;
pub mod plan;

pub use gate::{QuotaDecision, QuotaError, UsageAction, UsageGate};
pub use plan::{BillingStatus, PlanLimits, PlanTier, Subscription};
