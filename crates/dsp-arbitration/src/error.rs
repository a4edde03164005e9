//! # Arbitration Error Types

use thiserror::Error;

use dsp_core::CoreError;
use dsp_lifecycle::LifecycleError;

/// Errors raised by incident-resolution flows.
#[derive(Error, Debug)]
pub enum ArbitrationError {
    /// The underlying booking transition was rejected.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A partial refund exceeds the agreed price or mismatches currency.
    #[error("invalid refund amount: {0}")]
    InvalidRefund(#[source] CoreError),
}
