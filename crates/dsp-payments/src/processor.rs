//! # Webhook Processor
//!
//! Consumes provider deliveries: verifies the signature, records the
//! event for idempotency, dispatches on the typed event kind, and marks
//! the record with the handler's outcome.
//!
//! Acknowledgement policy: every delivery that passes signature
//! verification is acknowledged to the provider (2xx) — duplicates,
//! unroutable events, missing metadata, and even handler failures. The
//! provider cannot resolve our internal problems; redelivery of a
//! recorded event would be discarded by the uniqueness guard anyway,
//! and failures surface through the event record and logs.

use std::sync::Arc;

use dsp_core::Timestamp;
use dsp_lifecycle::BookingStatus;
use dsp_store::{MarketStore, WebhookEventRecord, WebhookOutcome};

use crate::error::PaymentError;
use crate::event::{EventKind, ProviderEvent};
use crate::signature::SignatureVerifier;

/// Acknowledgement returned to the transport layer.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WebhookAck {
    /// The event was routed and its handler succeeded.
    Processed {
        /// The provider event type.
        event_type: String,
    },
    /// The event id was seen before; no side effects were applied.
    Duplicate,
    /// The event was acknowledged without side effects (unroutable,
    /// missing metadata, or unparseable after a valid signature).
    Ignored {
        /// Why the event was ignored.
        reason: String,
    },
    /// The handler failed; the failure is recorded on the event record.
    Failed {
        /// Handler error message.
        error: String,
    },
}

/// The webhook processor.
pub struct WebhookProcessor<S> {
    store: Arc<S>,
    verifier: SignatureVerifier,
}

impl<S: MarketStore> WebhookProcessor<S> {
    /// Create a processor over the given store and endpoint secret
    /// verifier.
    pub fn new(store: Arc<S>, verifier: SignatureVerifier) -> Self {
        Self { store, verifier }
    }

    /// Process one delivery.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::SignatureInvalid`] — the only error that
    /// rejects the delivery. Everything else acknowledges.
    pub fn process(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookAck, PaymentError> {
        // (a) Signature first. No state is touched before this passes.
        self.verifier
            .verify(payload, signature_header, Timestamp::now().epoch_secs())?;

        metrics::counter!("webhook_events_received_total").increment(1);

        // A payload that verified but does not parse cannot be recorded
        // (no event id) — log and acknowledge.
        let event = match ProviderEvent::parse(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "signed but unparseable webhook payload");
                return Ok(WebhookAck::Ignored {
                    reason: "unparseable payload".to_string(),
                });
            }
        };

        // (b) Idempotency: insert-before-process keyed by event id.
        let record = WebhookEventRecord::pending(
            event.event_id(),
            event.event_type.clone(),
            serde_json::from_slice(payload).unwrap_or(serde_json::Value::Null),
        );
        match self.store.insert_event(record) {
            Ok(()) => {}
            Err(dsp_store::StoreError::DuplicateEvent(id)) => {
                metrics::counter!("webhook_events_duplicate_total").increment(1);
                tracing::info!(event = %id, "duplicate webhook delivery acknowledged");
                return Ok(WebhookAck::Duplicate);
            }
            Err(e) => return Err(e.into()),
        }

        // (c) Dispatch, (d) record the outcome.
        let event_id = event.event_id();
        match self.dispatch(&event) {
            Ok(ack) => {
                self.store
                    .mark_event(&event_id, WebhookOutcome::Processed)?;
                Ok(ack)
            }
            Err(e) => {
                metrics::counter!("webhook_events_failed_total").increment(1);
                tracing::error!(
                    event = %event_id,
                    event_type = %event.event_type,
                    error = %e,
                    "webhook handler failed"
                );
                let error = e.to_string();
                self.store.mark_event(
                    &event_id,
                    WebhookOutcome::Failed {
                        error: error.clone(),
                    },
                )?;
                Ok(WebhookAck::Failed { error })
            }
        }
    }

    /// Route the event to its handler.
    fn dispatch(&self, event: &ProviderEvent) -> Result<WebhookAck, PaymentError> {
        match event.kind() {
            EventKind::CheckoutCompleted | EventKind::PaymentSucceeded => {
                self.handle_payment_captured(event)
            }
            EventKind::PaymentFailed => self.handle_payment_failed(event),
            EventKind::RefundCreated | EventKind::RefundUpdated => {
                self.handle_refund_pending(event)
            }
            EventKind::RefundSucceeded | EventKind::ChargeRefunded => {
                self.handle_refund_succeeded(event)
            }
            EventKind::PayoutAccountVerified => self.handle_payout_verified(event),
            EventKind::Unhandled(event_type) => {
                metrics::counter!("webhook_events_unhandled_total").increment(1);
                tracing::info!(event_type = %event_type, "unhandled webhook event acknowledged");
                Ok(WebhookAck::Ignored {
                    reason: format!("unhandled event type: {event_type}"),
                })
            }
        }
    }

    /// The booking referenced by the event, or an `Ignored` ack if the
    /// metadata is missing or malformed.
    fn booking_scope(&self, event: &ProviderEvent) -> Result<dsp_core::BookingId, WebhookAck> {
        match event.booking_id() {
            Some(id) => Ok(id),
            None => {
                tracing::warn!(
                    event = %event.id,
                    event_type = %event.event_type,
                    "webhook event without booking_id metadata; ignoring"
                );
                Err(WebhookAck::Ignored {
                    reason: "missing booking_id metadata".to_string(),
                })
            }
        }
    }

    fn handle_payment_captured(&self, event: &ProviderEvent) -> Result<WebhookAck, PaymentError> {
        let booking_id = match self.booking_scope(event) {
            Ok(id) => id,
            Err(ack) => return Ok(ack),
        };
        let payment_id = event.payment_id();
        let status = event.object_status().to_string();

        self.store
            .update_booking_and_job(&booking_id, |booking, job| {
                if let Some(payment_id) = payment_id.clone() {
                    booking.record_payment_captured(payment_id, status.clone())?;
                } else {
                    booking.record_payment_captured(
                        dsp_core::ProviderPaymentId::new(event.id.clone()),
                        status.clone(),
                    )?;
                }
                job.mirror_booking(booking.status);
                Ok::<_, PaymentError>(())
            })??;

        tracing::info!(booking = %booking_id, "payment capture recorded");
        Ok(WebhookAck::Processed {
            event_type: event.event_type.clone(),
        })
    }

    fn handle_payment_failed(&self, event: &ProviderEvent) -> Result<WebhookAck, PaymentError> {
        let booking_id = match self.booking_scope(event) {
            Ok(id) => id,
            Err(ack) => return Ok(ack),
        };
        let status = event.object_status().to_string();

        self.store.update_booking(&booking_id, |booking| {
            booking.record_payment_failed(status.clone());
            Ok::<_, PaymentError>(())
        })??;

        tracing::warn!(booking = %booking_id, "payment failure recorded; awaiting follow-up");
        Ok(WebhookAck::Processed {
            event_type: event.event_type.clone(),
        })
    }

    fn handle_refund_pending(&self, event: &ProviderEvent) -> Result<WebhookAck, PaymentError> {
        let booking_id = match self.booking_scope(event) {
            Ok(id) => id,
            Err(ack) => return Ok(ack),
        };
        let status = event.object_status().to_string();

        self.store.update_booking(&booking_id, |booking| {
            booking.record_refund_pending(status.clone());
            Ok::<_, PaymentError>(())
        })??;

        Ok(WebhookAck::Processed {
            event_type: event.event_type.clone(),
        })
    }

    fn handle_refund_succeeded(&self, event: &ProviderEvent) -> Result<WebhookAck, PaymentError> {
        let booking_id = match self.booking_scope(event) {
            Ok(id) => id,
            Err(ack) => return Ok(ack),
        };
        let status = event.object_status().to_string();

        self.store
            .update_booking_and_job(&booking_id, |booking, job| {
                let was_completed = booking.status == BookingStatus::Completed;
                booking.record_refund_succeeded(status.clone())?;
                job.mirror_booking(booking.status);
                if was_completed {
                    tracing::warn!(
                        booking = %booking.id,
                        "refund succeeded on a completed booking; flag for reconciliation"
                    );
                }
                Ok::<_, PaymentError>(())
            })??;

        tracing::info!(booking = %booking_id, "refund succeeded; booking cancelled");
        Ok(WebhookAck::Processed {
            event_type: event.event_type.clone(),
        })
    }

    fn handle_payout_verified(&self, event: &ProviderEvent) -> Result<WebhookAck, PaymentError> {
        let driver_id = match event.driver_id() {
            Some(id) => id,
            None => {
                tracing::warn!(
                    event = %event.id,
                    "payout verification event without driver_id metadata; ignoring"
                );
                return Ok(WebhookAck::Ignored {
                    reason: "missing driver_id metadata".to_string(),
                });
            }
        };

        self.store.update_driver(&driver_id, |driver| {
            driver.mark_payout_eligible();
            Ok::<_, PaymentError>(())
        })??;

        tracing::info!(driver = %driver_id, "driver payout account verified");
        Ok(WebhookAck::Processed {
            event_type: event.event_type.clone(),
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dsp_core::{Actor, BookingId, CompanyId, DriverId, Money};
    use dsp_lifecycle::{Booking, DriverProfile, Job, JobStatus, SettlementStatus};
    use dsp_store::MemoryStore;

    const SECRET: &str = "whsec_processor_test";

    struct Fixture {
        store: Arc<MemoryStore>,
        processor: WebhookProcessor<MemoryStore>,
        job: Job,
        booking: Booking,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let processor =
            WebhookProcessor::new(store.clone(), SignatureVerifier::new(SECRET));

        let job = Job::new(
            CompanyId::new(),
            "Webhook test run",
            Money::new(25_000, "EUR").unwrap(),
            false,
            None,
        );
        let driver = DriverProfile::new(DriverId::new());
        let mut booking = Booking::new(job.id, driver.id, Money::new(25_000, "EUR").unwrap());
        booking
            .accept(&Actor::Company(job.company_id), &job)
            .unwrap();

        store.insert_job(job.clone()).unwrap();
        store.insert_driver(driver).unwrap();
        store.insert_booking(booking.clone()).unwrap();

        Fixture {
            store,
            processor,
            job,
            booking,
        }
    }

    fn signed(payload: &[u8]) -> String {
        SignatureVerifier::new(SECRET).sign(payload, Timestamp::now().epoch_secs())
    }

    fn event_payload(event_id: &str, event_type: &str, booking_id: Option<BookingId>) -> Vec<u8> {
        let metadata = match booking_id {
            Some(id) => serde_json::json!({"booking_id": id.as_uuid().to_string()}),
            None => serde_json::json!({}),
        };
        serde_json::to_vec(&serde_json::json!({
            "id": event_id,
            "type": event_type,
            "created": Timestamp::now().epoch_secs(),
            "data": {"object": {"id": "pi_77", "status": "succeeded", "metadata": metadata}}
        }))
        .unwrap()
    }

    #[test]
    fn test_bad_signature_rejected_without_state_change() {
        let f = fixture();
        let payload = event_payload("evt_1", "payment_intent.succeeded", Some(f.booking.id));
        let result = f.processor.process(&payload, "t=1,v1=00");
        assert!(matches!(result, Err(PaymentError::SignatureInvalid(_))));
        // No event record, no booking mutation.
        assert!(f
            .store
            .get_event(&dsp_core::ProviderEventId::new("evt_1"))
            .is_err());
        assert_eq!(
            f.store.get_booking(&f.booking.id).unwrap().settlement,
            SettlementStatus::Unpaid
        );
    }

    #[test]
    fn test_capture_event_advances_booking_and_job() {
        let f = fixture();
        let payload = event_payload("evt_1", "payment_intent.succeeded", Some(f.booking.id));
        let ack = f.processor.process(&payload, &signed(&payload)).unwrap();
        assert!(matches!(ack, WebhookAck::Processed { .. }));

        let booking = f.store.get_booking(&f.booking.id).unwrap();
        assert_eq!(booking.settlement, SettlementStatus::Captured);
        assert_eq!(booking.status, BookingStatus::InProgress);
        assert_eq!(
            f.store.get_job(&f.job.id).unwrap().status,
            JobStatus::InProgress
        );
        assert_eq!(
            f.store
                .get_event(&dsp_core::ProviderEventId::new("evt_1"))
                .unwrap()
                .outcome,
            WebhookOutcome::Processed
        );
    }

    #[test]
    fn test_duplicate_event_id_applies_once() {
        let f = fixture();
        let payload = event_payload("evt_1", "payment_intent.succeeded", Some(f.booking.id));
        let header = signed(&payload);

        let first = f.processor.process(&payload, &header).unwrap();
        assert!(matches!(first, WebhookAck::Processed { .. }));
        let after_first = f.store.get_booking(&f.booking.id).unwrap();

        let second = f.processor.process(&payload, &header).unwrap();
        assert_eq!(second, WebhookAck::Duplicate);
        let after_second = f.store.get_booking(&f.booking.id).unwrap();

        // Identical observable state: same transitions, same timestamps.
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn test_payment_failed_sets_settlement_only() {
        let f = fixture();
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": "evt_2",
            "type": "payment_intent.payment_failed",
            "created": Timestamp::now().epoch_secs(),
            "data": {"object": {
                "id": "pi_77",
                "status": "requires_payment_method",
                "metadata": {"booking_id": f.booking.id.as_uuid().to_string()}
            }}
        }))
        .unwrap();
        f.processor.process(&payload, &signed(&payload)).unwrap();

        let booking = f.store.get_booking(&f.booking.id).unwrap();
        assert_eq!(booking.settlement, SettlementStatus::Failed);
        // Progress untouched; cancellation is a human decision.
        assert_eq!(booking.status, BookingStatus::Assigned);
    }

    #[test]
    fn test_refund_pending_then_succeeded_cancels_pair() {
        let f = fixture();
        let capture = event_payload("evt_1", "payment_intent.succeeded", Some(f.booking.id));
        f.processor.process(&capture, &signed(&capture)).unwrap();

        let created = event_payload("evt_2", "refund.created", Some(f.booking.id));
        f.processor.process(&created, &signed(&created)).unwrap();
        assert_eq!(
            f.store.get_booking(&f.booking.id).unwrap().settlement,
            SettlementStatus::RefundPending
        );
        // Intermediate refund states never cancel.
        assert_eq!(
            f.store.get_booking(&f.booking.id).unwrap().status,
            BookingStatus::InProgress
        );

        let succeeded = event_payload("evt_3", "refund.succeeded", Some(f.booking.id));
        f.processor.process(&succeeded, &signed(&succeeded)).unwrap();
        let booking = f.store.get_booking(&f.booking.id).unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.settlement, SettlementStatus::Refunded);
        assert_eq!(
            f.store.get_job(&f.job.id).unwrap().status,
            JobStatus::Cancelled
        );
    }

    #[test]
    fn test_missing_booking_metadata_is_ignored_not_crash() {
        let f = fixture();
        let payload = event_payload("evt_4", "payment_intent.succeeded", None);
        let ack = f.processor.process(&payload, &signed(&payload)).unwrap();
        assert!(matches!(ack, WebhookAck::Ignored { .. }));
        // Recorded as processed so redelivery is deduplicated.
        assert_eq!(
            f.store
                .get_event(&dsp_core::ProviderEventId::new("evt_4"))
                .unwrap()
                .outcome,
            WebhookOutcome::Processed
        );
    }

    #[test]
    fn test_unhandled_event_type_acknowledged() {
        let f = fixture();
        let payload = event_payload("evt_5", "invoice.finalized", Some(f.booking.id));
        let ack = f.processor.process(&payload, &signed(&payload)).unwrap();
        assert_eq!(
            ack,
            WebhookAck::Ignored {
                reason: "unhandled event type: invoice.finalized".to_string()
            }
        );
    }

    #[test]
    fn test_payout_verified_marks_driver() {
        let f = fixture();
        let driver_id = f.booking.driver_id;
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": "evt_6",
            "type": "payout_account.verified",
            "created": Timestamp::now().epoch_secs(),
            "data": {"object": {
                "id": "acct_1",
                "status": "verified",
                "metadata": {"driver_id": driver_id.as_uuid().to_string()}
            }}
        }))
        .unwrap();
        f.processor.process(&payload, &signed(&payload)).unwrap();
        assert!(f.store.get_driver(&driver_id).unwrap().payout_eligible);
    }

    #[test]
    fn test_handler_failure_recorded_on_event() {
        let f = fixture();
        // Event referencing a booking that does not exist.
        let payload = event_payload("evt_7", "payment_intent.succeeded", Some(BookingId::new()));
        let ack = f.processor.process(&payload, &signed(&payload)).unwrap();
        assert!(matches!(ack, WebhookAck::Failed { .. }));
        assert!(matches!(
            f.store
                .get_event(&dsp_core::ProviderEventId::new("evt_7"))
                .unwrap()
                .outcome,
            WebhookOutcome::Failed { .. }
        ));
    }

    #[test]
    fn test_unparseable_signed_payload_acknowledged() {
        let f = fixture();
        let payload = b"{\"id\": \"evt_8\"}".to_vec();
        let ack = f.processor.process(&payload, &signed(&payload)).unwrap();
        assert!(matches!(ack, WebhookAck::Ignored { .. }));
    }
}
