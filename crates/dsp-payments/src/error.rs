//! # Payment Error Types

use thiserror::Error;

use dsp_lifecycle::LifecycleError;
use dsp_store::StoreError;

/// Errors raised by the payment integration.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Webhook signature verification failed. The delivery is rejected
    /// outright; the provider treats this as permanent.
    #[error("webhook signature invalid: {0}")]
    SignatureInvalid(String),

    /// The payload could not be parsed as a provider event.
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    /// Storage failure while recording or applying the event.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A booking transition rejected the event's mutation.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
