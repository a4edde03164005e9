//! # Engine Error Taxonomy
//!
//! One enum covering the synchronous failure classes: validation,
//! authorization (inside `Lifecycle`), conflicts, quota denials, and
//! storage failures. The API layer maps each class to its HTTP status.

use thiserror::Error;

use dsp_arbitration::ArbitrationError;
use dsp_lifecycle::{JobStatus, LifecycleError};
use dsp_quota::QuotaError;
use dsp_store::StoreError;

/// Errors raised by engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed or semantically invalid input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Denied by the usage gate.
    #[error(transparent)]
    Quota(#[from] QuotaError),

    /// A lifecycle transition was rejected (authorization or guard).
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// An incident-resolution flow was rejected.
    #[error(transparent)]
    Arbitration(#[from] ArbitrationError),

    /// Storage failure (missing entity, duplicate application).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The driver cannot take work right now.
    #[error("driver is not available: {reason}")]
    DriverUnavailable {
        /// Why the driver is unavailable.
        reason: String,
    },

    /// The job is not accepting applications or acceptances.
    #[error("job is not open: current status is {status}")]
    JobNotOpen {
        /// The job's current status, for caller resynchronization.
        status: JobStatus,
    },
}

impl From<dsp_core::CoreError> for EngineError {
    fn from(err: dsp_core::CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}
