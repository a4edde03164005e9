//! # Provider Events
//!
//! Wire shape of the payment provider's webhook payloads and the typed
//! event sum the processor dispatches on. Event routing is a closed
//! enum with an explicit [`EventKind::Unhandled`] variant — unknown
//! types are logged and acknowledged, never silently dropped and never
//! a crash.

use std::collections::HashMap;

use serde::Deserialize;
use uuid::Uuid;

use dsp_core::{BookingId, DriverId, ProviderEventId, ProviderPaymentId};

use crate::error::PaymentError;

// ─── Event Kind ──────────────────────────────────────────────────────

/// The known provider event types, plus `Unhandled` for everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Checkout completed — the company's payment was captured.
    CheckoutCompleted,
    /// Payment captured outside checkout (payment intent succeeded).
    PaymentSucceeded,
    /// Payment attempt failed.
    PaymentFailed,
    /// A refund was created; not yet terminal.
    RefundCreated,
    /// A refund changed state; not yet terminal.
    RefundUpdated,
    /// A refund reached its terminal success state.
    RefundSucceeded,
    /// The full charge was refunded (provider shorthand for a
    /// successful refund of everything).
    ChargeRefunded,
    /// The driver's payout account passed provider verification.
    PayoutAccountVerified,
    /// Any event type this processor does not route.
    Unhandled(String),
}

impl EventKind {
    /// Map a provider event-type string to its kind.
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => Self::CheckoutCompleted,
            "payment_intent.succeeded" => Self::PaymentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentFailed,
            "refund.created" => Self::RefundCreated,
            "refund.updated" => Self::RefundUpdated,
            "refund.succeeded" => Self::RefundSucceeded,
            "charge.refunded" => Self::ChargeRefunded,
            "payout_account.verified" => Self::PayoutAccountVerified,
            other => Self::Unhandled(other.to_string()),
        }
    }
}

// ─── Wire Shape ──────────────────────────────────────────────────────

/// The object an event describes (payment, refund, or account).
#[derive(Debug, Clone, Deserialize)]
pub struct EventObject {
    /// Provider id of the described object.
    pub id: Option<String>,
    /// Provider status string, verbatim.
    pub status: Option<String>,
    /// Provider metadata map. Must carry the booking id for
    /// booking-scoped events; the processor is defensive against its
    /// absence.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Envelope around the event object.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    /// The described object.
    pub object: EventObject,
}

/// A received provider event.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEvent {
    /// Provider event id — the idempotency key.
    pub id: String,
    /// Provider event type string.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Provider-side creation time (Unix seconds).
    pub created: Option<i64>,
    /// The event payload.
    pub data: EventData,
}

impl ProviderEvent {
    /// Parse a raw payload into a provider event.
    pub fn parse(payload: &[u8]) -> Result<Self, PaymentError> {
        serde_json::from_slice(payload)
            .map_err(|e| PaymentError::MalformedPayload(e.to_string()))
    }

    /// The typed event kind.
    pub fn kind(&self) -> EventKind {
        EventKind::from_type(&self.event_type)
    }

    /// The provider event id as the domain newtype.
    pub fn event_id(&self) -> ProviderEventId {
        ProviderEventId::new(self.id.clone())
    }

    /// The provider payment id of the described object, if present.
    pub fn payment_id(&self) -> Option<ProviderPaymentId> {
        self.data
            .object
            .id
            .as_ref()
            .map(|id| ProviderPaymentId::new(id.clone()))
    }

    /// The raw provider status of the described object.
    pub fn object_status(&self) -> &str {
        self.data.object.status.as_deref().unwrap_or("")
    }

    /// The booking referenced in metadata, if present and well-formed.
    pub fn booking_id(&self) -> Option<BookingId> {
        self.metadata_uuid("booking_id").map(BookingId::from_uuid)
    }

    /// The driver referenced in metadata, if present and well-formed.
    pub fn driver_id(&self) -> Option<DriverId> {
        self.metadata_uuid("driver_id").map(DriverId::from_uuid)
    }

    fn metadata_uuid(&self, key: &str) -> Option<Uuid> {
        self.data
            .object
            .metadata
            .get(key)
            .and_then(|raw| raw.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(event_type: &str, metadata: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": "evt_42",
            "type": event_type,
            "created": 1_700_000_000,
            "data": {
                "object": {
                    "id": "pi_7",
                    "status": "succeeded",
                    "metadata": metadata
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_full_event() {
        let booking = BookingId::new();
        let raw = payload(
            "payment_intent.succeeded",
            serde_json::json!({"booking_id": booking.as_uuid().to_string()}),
        );
        let event = ProviderEvent::parse(&raw).unwrap();
        assert_eq!(event.kind(), EventKind::PaymentSucceeded);
        assert_eq!(event.event_id(), ProviderEventId::new("evt_42"));
        assert_eq!(event.booking_id(), Some(booking));
        assert_eq!(event.object_status(), "succeeded");
        assert_eq!(
            event.payment_id(),
            Some(ProviderPaymentId::new("pi_7"))
        );
    }

    #[test]
    fn test_unknown_type_is_unhandled() {
        assert_eq!(
            EventKind::from_type("invoice.finalized"),
            EventKind::Unhandled("invoice.finalized".to_string())
        );
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            EventKind::from_type("checkout.session.completed"),
            EventKind::CheckoutCompleted
        );
        assert_eq!(
            EventKind::from_type("payment_intent.payment_failed"),
            EventKind::PaymentFailed
        );
        assert_eq!(
            EventKind::from_type("charge.refunded"),
            EventKind::ChargeRefunded
        );
        assert_eq!(
            EventKind::from_type("payout_account.verified"),
            EventKind::PayoutAccountVerified
        );
    }

    #[test]
    fn test_missing_metadata_is_none_not_crash() {
        let raw = payload("payment_intent.succeeded", serde_json::json!({}));
        let event = ProviderEvent::parse(&raw).unwrap();
        assert_eq!(event.booking_id(), None);
        assert_eq!(event.driver_id(), None);
    }

    #[test]
    fn test_malformed_metadata_uuid_is_none() {
        let raw = payload(
            "payment_intent.succeeded",
            serde_json::json!({"booking_id": "not-a-uuid"}),
        );
        let event = ProviderEvent::parse(&raw).unwrap();
        assert_eq!(event.booking_id(), None);
    }

    #[test]
    fn test_garbage_payload_is_malformed() {
        assert!(matches!(
            ProviderEvent::parse(b"not json"),
            Err(PaymentError::MalformedPayload(_))
        ));
        assert!(matches!(
            ProviderEvent::parse(br#"{"id": "evt_1"}"#),
            Err(PaymentError::MalformedPayload(_))
        ));
    }
}
