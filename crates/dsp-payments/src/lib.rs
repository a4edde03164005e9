//! # dsp-payments — Payment Provider Integration
//!
//! Consumes asynchronous, at-least-once webhook events from the payment
//! provider and owns the outbound fund-transfer seam.
//!
//! ## Pipeline
//!
//! ```text
//! raw payload + signature header
//!        │
//!   verify signature ──invalid──▶ rejected (no state touched)
//!        │
//!   parse payload ──unparseable──▶ logged + acknowledged
//!        │
//!   insert WebhookEventRecord ──duplicate id──▶ acknowledged, no side effects
//!        │
//!   dispatch on typed EventKind (Unhandled is logged + acknowledged)
//!        │
//!   mark record Processed / Failed
//! ```
//!
//! Handlers are additionally self-idempotent: a duplicate that slips in
//! before the uniqueness insert commits re-applies a settlement that is
//! already recorded, which the lifecycle methods treat as a no-op.
//!
//! ## Crate Policy
//!
//! - Mutates entities only through [`dsp_store::MarketStore`] atomic updates.
//! - Never initiates transfers — that is the engine's decision at
//!   completion validation; this crate only defines the client seam.

pub mod error;
pub mod event;
pub mod processor;
pub mod signature;
pub mod transfer;

pub use error::PaymentError;
pub use event::{EventKind, ProviderEvent};
pub use processor::{WebhookAck, WebhookProcessor};
pub use signature::SignatureVerifier;
pub use transfer::{
    ensure_transfer, InstantTransferClient, RecordingTransferClient, TransferClient,
    TransferDecision, TransferOutcome, TransferRequest,
};
