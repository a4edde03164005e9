//! # dsp-core — Foundational Types for the Dispatch Stack
//!
//! This crate is the bedrock of the Dispatch Stack. It defines the
//! type-system primitives shared by every other crate in the workspace;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `JobId`, `BookingId`,
//!    `DriverId`, `CompanyId`, `AdminId`, `ProviderEventId` — no bare
//!    strings or UUIDs for identifiers. You cannot pass a `DriverId`
//!    where a `CompanyId` is expected.
//!
//! 2. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision. Non-UTC inputs are rejected at
//!    construction, not silently converted.
//!
//! 3. **Integer minor-unit money.** `Money` carries an `i64` amount in
//!    the smallest currency unit (cents). Monetary values are never
//!    floats anywhere in the system.
//!
//! 4. **Acting party as data.** Every state transition is authorized
//!    against an [`Actor`] value — the acting company, driver, or
//!    administrator — rather than ambient session state.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `dsp-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize` where they are persisted or sent on the wire.

pub mod actor;
pub mod error;
pub mod identity;
pub mod money;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use actor::Actor;
pub use error::CoreError;
pub use identity::{
    AdminId, BookingId, CompanyId, DriverId, JobId, ProviderEventId, ProviderPaymentId, UserId,
};
pub use money::Money;
pub use temporal::Timestamp;
