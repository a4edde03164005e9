//! # Webhook Event Records
//!
//! Immutable audit rows for received payment-provider events, keyed by
//! the provider's event id. A record is inserted *before* its handler
//! runs and updated exactly once afterwards — never mutated otherwise.

use serde::{Deserialize, Serialize};

use dsp_core::{ProviderEventId, Timestamp};

/// Final outcome of an event's handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// Inserted, handler not finished yet.
    Pending,
    /// Handler completed successfully.
    Processed,
    /// Handler failed; the error is kept for operational visibility.
    Failed {
        /// Handler error message.
        error: String,
    },
}

/// An audit record of one received provider event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEventRecord {
    /// Provider-assigned event id — the idempotency key.
    pub event_id: ProviderEventId,
    /// Provider event type string, verbatim.
    pub event_type: String,
    /// Raw event payload, kept for replay and debugging.
    pub payload: serde_json::Value,
    /// When the event was received (UTC).
    pub received_at: Timestamp,
    /// Handler outcome.
    pub outcome: WebhookOutcome,
}

impl WebhookEventRecord {
    /// Create a pending record for a just-received event.
    pub fn pending(
        event_id: ProviderEventId,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            payload,
            received_at: Timestamp::now(),
            outcome: WebhookOutcome::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_record() {
        let rec = WebhookEventRecord::pending(
            ProviderEventId::new("evt_1"),
            "payment_intent.succeeded",
            serde_json::json!({"id": "evt_1"}),
        );
        assert_eq!(rec.outcome, WebhookOutcome::Pending);
        assert_eq!(rec.event_type, "payment_intent.succeeded");
    }

    #[test]
    fn test_outcome_serialization() {
        let failed = WebhookOutcome::Failed {
            error: "booking missing".into(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["error"], "booking missing");
    }
}
