//! # BookingEngine
//!
//! Orchestrates the domain crates over the store. Method bodies follow
//! one shape: load what the guards need, run the transition(s) inside
//! the narrowest atomic store update that covers every mutated entity,
//! and return the updated booking so callers always see the
//! authoritative state.

use std::sync::Arc;

use dsp_arbitration::{confirm_no_show, report_no_show, resolve_dispute, DisputeOutcome, Sanction};
use dsp_core::{Actor, AdminId, BookingId, CompanyId, DriverId, JobId, Money, Timestamp, UserId};
use dsp_lifecycle::{Booking, DisputeAction, DriverProfile, Job};
use dsp_payments::{ensure_transfer, TransferClient, TransferDecision};
use dsp_quota::{UsageAction, UsageGate};
use dsp_store::MarketStore;

use crate::error::EngineError;

/// The synchronous operation surface.
pub struct BookingEngine<S> {
    store: Arc<S>,
    transfers: Arc<dyn TransferClient>,
    gate: UsageGate,
}

impl<S: MarketStore> BookingEngine<S> {
    /// Create an engine over the given store and transfer client.
    pub fn new(store: Arc<S>, transfers: Arc<dyn TransferClient>) -> Self {
        Self {
            store,
            transfers,
            gate: UsageGate,
        }
    }

    // ── Creation (quota-gated) ───────────────────────────────────────

    /// Publish a new job for a company.
    ///
    /// Consults the usage gate first; records the usage after the job
    /// is persisted, per the gate's check-create-record contract.
    pub fn create_job(
        &self,
        company: CompanyId,
        title: String,
        day_rate: Money,
        urgent: bool,
        urgency_bonus: Option<Money>,
    ) -> Result<Job, EngineError> {
        if title.trim().is_empty() {
            return Err(EngineError::Validation("job title must be non-empty".into()));
        }
        let user = user_of_company(&company);
        self.gate
            .check(self.store.get_subscription(&user).as_ref(), UsageAction::PublishJob)?;

        let job = Job::new(company, title, day_rate, urgent, urgency_bonus);
        self.store.insert_job(job.clone())?;
        self.store.update_subscription(&user, |sub| {
            self.gate.record(sub, UsageAction::PublishJob);
            Ok::<_, EngineError>(())
        })?;

        tracing::info!(job = %job.id, company = %company, "job published");
        Ok(job)
    }

    /// A driver applies to an open job, creating a `Pending` booking.
    pub fn apply_to_job(&self, job_id: JobId, driver: DriverId) -> Result<Booking, EngineError> {
        let job = self.store.get_job(&job_id)?;
        if !job.is_open() {
            return Err(EngineError::JobNotOpen { status: job.status });
        }

        let profile = self.store.get_driver(&driver)?;
        if profile.banned {
            return Err(EngineError::DriverUnavailable {
                reason: "driver is permanently banned".into(),
            });
        }
        if profile.is_suspended(Timestamp::now()) {
            return Err(EngineError::DriverUnavailable {
                reason: "driver is suspended".into(),
            });
        }
        if !profile.is_available {
            return Err(EngineError::DriverUnavailable {
                reason: "driver is marked unavailable".into(),
            });
        }

        let user = user_of_driver(&driver);
        self.gate.check(
            self.store.get_subscription(&user).as_ref(),
            UsageAction::SubmitApplication,
        )?;

        let booking = Booking::new(job_id, driver, job.total_price()?);
        // Enforces at most one live booking per (job, driver).
        self.store.insert_booking(booking.clone())?;
        self.store.update_subscription(&user, |sub| {
            self.gate.record(sub, UsageAction::SubmitApplication);
            Ok::<_, EngineError>(())
        })?;

        tracing::info!(booking = %booking.id, job = %job_id, driver = %driver, "application created");
        Ok(booking)
    }

    // ── Lifecycle transitions ────────────────────────────────────────

    /// Company accepts one candidate (PENDING → ASSIGNED).
    ///
    /// Acceptance exclusivity: rejected unless the job is still `Open`,
    /// so a second candidate cannot be accepted while one booking is
    /// live.
    pub fn accept_candidate(
        &self,
        booking_id: BookingId,
        acting: Actor,
    ) -> Result<Booking, EngineError> {
        self.store
            .update_booking_and_job(&booking_id, |booking, job| {
                if !job.is_open() {
                    return Err(EngineError::JobNotOpen { status: job.status });
                }
                booking.accept(&acting, job)?;
                job.mirror_booking(booking.status);
                Ok(booking.clone())
            })?
    }

    /// Driver starts work (ASSIGNED → IN_PROGRESS).
    pub fn start_work(&self, booking_id: BookingId, acting: Actor) -> Result<Booking, EngineError> {
        self.store
            .update_booking_and_job(&booking_id, |booking, job| {
                booking.start(&acting)?;
                job.mirror_booking(booking.status);
                Ok::<_, EngineError>(booking.clone())
            })?
    }

    /// Driver marks the delivery performed.
    pub fn mark_delivered(
        &self,
        booking_id: BookingId,
        acting: Actor,
        proof: Option<String>,
    ) -> Result<Booking, EngineError> {
        self.store
            .update_booking_and_job(&booking_id, |booking, job| {
                booking.mark_delivered(&acting, proof)?;
                job.mirror_booking(booking.status);
                Ok::<_, EngineError>(booking.clone())
            })?
    }

    /// Company validates completion (DELIVERED → COMPLETED), increments
    /// the driver's delivery count, and initiates the fund transfer if
    /// it has not happened yet.
    pub fn validate_completion(
        &self,
        booking_id: BookingId,
        acting: Actor,
    ) -> Result<Booking, EngineError> {
        let transfers = self.transfers.clone();
        self.store
            .update_incident(&booking_id, |booking, job, driver| {
                booking.validate_completion(&acting, job)?;
                job.mirror_booking(booking.status);
                driver.record_delivery();

                let amount = booking.agreed_price.clone();
                let decision = ensure_transfer(booking, driver, transfers.as_ref(), amount)?;
                if decision == TransferDecision::DriverNotEligible {
                    tracing::warn!(
                        booking = %booking.id,
                        "completion validated but transfer deferred: driver not payout-eligible"
                    );
                }
                Ok::<_, EngineError>(booking.clone())
            })?
    }

    /// Company or administrator cancels a booking.
    pub fn cancel_booking(
        &self,
        booking_id: BookingId,
        acting: Actor,
        reason: String,
    ) -> Result<Booking, EngineError> {
        self.store
            .update_booking_and_job(&booking_id, |booking, job| {
                booking.cancel(&acting, job, reason)?;
                job.mirror_booking(booking.status);
                Ok::<_, EngineError>(booking.clone())
            })?
    }

    // ── No-show flow ─────────────────────────────────────────────────

    /// Company reports a driver no-show.
    pub fn report_no_show(
        &self,
        booking_id: BookingId,
        acting: Actor,
        reason: String,
    ) -> Result<Booking, EngineError> {
        self.store
            .update_booking_and_job(&booking_id, |booking, job| {
                report_no_show(booking, job, &acting, reason)?;
                Ok::<_, EngineError>(booking.clone())
            })?
    }

    /// Confirm or dismiss a reported no-show.
    ///
    /// A confirmation cancels the booking, mirrors the job, and applies
    /// exactly one sanction to the driver. Returns the sanction, if any.
    pub fn confirm_no_show(
        &self,
        booking_id: BookingId,
        acting: Actor,
        confirmed: bool,
        comment: Option<String>,
    ) -> Result<(Booking, Option<Sanction>), EngineError> {
        self.store
            .update_incident(&booking_id, |booking, job, driver| {
                let sanction = confirm_no_show(booking, job, driver, &acting, confirmed, comment)?;
                Ok::<_, EngineError>((booking.clone(), sanction))
            })?
    }

    // ── Dispute flow ─────────────────────────────────────────────────

    /// Contest a delivered booking.
    pub fn open_dispute(
        &self,
        booking_id: BookingId,
        acting: Actor,
        reason: String,
    ) -> Result<Booking, EngineError> {
        self.store
            .update_booking_and_job(&booking_id, |booking, job| {
                booking.open_dispute(&acting, job, reason)?;
                Ok::<_, EngineError>(booking.clone())
            })?
    }

    /// Administrator resolves a dispute. Pays out through the transfer
    /// seam when the resolution owes the driver money.
    pub fn resolve_dispute(
        &self,
        booking_id: BookingId,
        admin: AdminId,
        action: DisputeAction,
        notes: String,
    ) -> Result<(Booking, DisputeOutcome), EngineError> {
        let transfers = self.transfers.clone();
        self.store
            .update_incident(&booking_id, |booking, job, driver| {
                let outcome = resolve_dispute(booking, job, admin, action, notes)?;
                if let Some(amount) = outcome.transfer_due.clone() {
                    driver.record_delivery();
                    ensure_transfer(booking, driver, transfers.as_ref(), amount)?;
                }
                Ok::<_, EngineError>((booking.clone(), outcome))
            })?
    }

    // ── Reads & onboarding hooks ─────────────────────────────────────

    /// Fetch a booking.
    pub fn booking(&self, id: &BookingId) -> Result<Booking, EngineError> {
        Ok(self.store.get_booking(id)?)
    }

    /// Fetch a job.
    pub fn job(&self, id: &JobId) -> Result<Job, EngineError> {
        Ok(self.store.get_job(id)?)
    }

    /// Fetch a driver profile.
    pub fn driver(&self, id: &DriverId) -> Result<DriverProfile, EngineError> {
        Ok(self.store.get_driver(id)?)
    }

    /// All bookings for a job, oldest first.
    pub fn bookings_for_job(&self, id: &JobId) -> Vec<Booking> {
        self.store.bookings_for_job(id)
    }

    /// Register a fresh driver profile (onboarding is a collaborator;
    /// this is the hook it calls).
    pub fn register_driver(&self, id: DriverId) -> Result<DriverProfile, EngineError> {
        let profile = DriverProfile::new(id);
        self.store.insert_driver(profile.clone())?;
        Ok(profile)
    }
}

fn user_of_company(id: &CompanyId) -> UserId {
    // Company and driver accounts live in the platform's single user
    // namespace; subscriptions are keyed by that user id.
    UserId::from_uuid(*id.as_uuid())
}

fn user_of_driver(id: &DriverId) -> UserId {
    UserId::from_uuid(*id.as_uuid())
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dsp_lifecycle::{BookingStatus, JobStatus, SettlementStatus, TransferStatus};
    use dsp_payments::{
        RecordingTransferClient, SignatureVerifier, TransferOutcome, WebhookProcessor,
    };
    use dsp_quota::{PlanTier, Subscription};
    use dsp_store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        engine: BookingEngine<MemoryStore>,
        transfers: Arc<RecordingTransferClient>,
        company: CompanyId,
        driver: DriverId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let transfers = Arc::new(RecordingTransferClient::returning(
            TransferOutcome::Completed {
                provider_transfer_id: "tr_test".into(),
            },
        ));
        let engine = BookingEngine::new(store.clone(), transfers.clone());
        let company = CompanyId::new();
        let driver = DriverId::new();
        engine.register_driver(driver).unwrap();
        // Both parties on unlimited plans unless a test overrides.
        store.put_subscription(Subscription::new(user_of_company(&company), PlanTier::Pro));
        store.put_subscription(Subscription::new(user_of_driver(&driver), PlanTier::Pro));
        Fixture {
            store,
            engine,
            transfers,
            company,
            driver,
        }
    }

    fn rate() -> Money {
        Money::new(35_000, "EUR").unwrap()
    }

    /// Drive a booking to `Delivered` with captured funds.
    fn delivered_booking(f: &Fixture) -> Booking {
        let job = f
            .engine
            .create_job(f.company, "Engine test run".into(), rate(), false, None)
            .unwrap();
        let booking = f.engine.apply_to_job(job.id, f.driver).unwrap();
        f.engine
            .accept_candidate(booking.id, Actor::Company(f.company))
            .unwrap();
        f.store
            .update_booking(&booking.id, |b| {
                b.record_payment_captured(dsp_core::ProviderPaymentId::new("pi_t"), "succeeded")
                    .map(|_| ())
            })
            .unwrap()
            .unwrap();
        f.engine
            .mark_delivered(booking.id, Actor::Driver(f.driver), Some("pod".into()))
            .unwrap()
    }

    fn make_payout_eligible(f: &Fixture) {
        f.store
            .update_driver(&f.driver, |d| {
                d.mark_payout_eligible();
                Ok::<_, EngineError>(())
            })
            .unwrap()
            .unwrap();
    }

    // ── Scenario 1: apply, accept, sibling stays pending ─────────────

    #[test]
    fn test_accept_locks_out_sibling_applications() {
        let f = fixture();
        let job = f
            .engine
            .create_job(f.company, "Two applicants".into(), rate(), false, None)
            .unwrap();

        let driver_b = DriverId::new();
        f.engine.register_driver(driver_b).unwrap();
        f.store
            .put_subscription(Subscription::new(user_of_driver(&driver_b), PlanTier::Pro));

        let b1 = f.engine.apply_to_job(job.id, f.driver).unwrap();
        let b2 = f.engine.apply_to_job(job.id, driver_b).unwrap();

        let accepted = f
            .engine
            .accept_candidate(b1.id, Actor::Company(f.company))
            .unwrap();
        assert_eq!(accepted.status, BookingStatus::Assigned);
        assert_eq!(f.engine.job(&job.id).unwrap().status, JobStatus::Assigned);

        // Sibling remains PENDING but cannot be accepted.
        assert_eq!(
            f.engine.booking(&b2.id).unwrap().status,
            BookingStatus::Pending
        );
        let result = f.engine.accept_candidate(b2.id, Actor::Company(f.company));
        assert!(matches!(result, Err(EngineError::JobNotOpen { .. })));
    }

    #[test]
    fn test_duplicate_application_rejected() {
        let f = fixture();
        let job = f
            .engine
            .create_job(f.company, "One slot".into(), rate(), false, None)
            .unwrap();
        f.engine.apply_to_job(job.id, f.driver).unwrap();
        let result = f.engine.apply_to_job(job.id, f.driver);
        assert!(matches!(
            result,
            Err(EngineError::Store(dsp_store::StoreError::DuplicateBooking { .. }))
        ));
    }

    #[test]
    fn test_apply_to_closed_job_rejected() {
        let f = fixture();
        let job = f
            .engine
            .create_job(f.company, "Closes fast".into(), rate(), false, None)
            .unwrap();
        let b1 = f.engine.apply_to_job(job.id, f.driver).unwrap();
        f.engine
            .accept_candidate(b1.id, Actor::Company(f.company))
            .unwrap();

        let late_driver = DriverId::new();
        f.engine.register_driver(late_driver).unwrap();
        let result = f.engine.apply_to_job(job.id, late_driver);
        assert!(matches!(result, Err(EngineError::JobNotOpen { .. })));
    }

    // ── Quota gating ─────────────────────────────────────────────────

    #[test]
    fn test_free_tier_company_denied_second_job() {
        let f = fixture();
        f.store
            .put_subscription(Subscription::new(user_of_company(&f.company), PlanTier::Free));

        f.engine
            .create_job(f.company, "First".into(), rate(), false, None)
            .unwrap();
        let result = f
            .engine
            .create_job(f.company, "Second".into(), rate(), false, None);
        match result {
            Err(EngineError::Quota(e)) => {
                let msg = e.to_string();
                assert!(msg.contains("1/1"));
                assert!(msg.contains("upgrade"));
            }
            other => panic!("expected quota denial, got: {other:?}"),
        }
    }

    #[test]
    fn test_unlimited_plan_never_denied() {
        let f = fixture();
        for i in 0..5 {
            f.engine
                .create_job(f.company, format!("Job {i}"), rate(), false, None)
                .unwrap();
        }
    }

    #[test]
    fn test_unavailable_driver_cannot_apply() {
        let f = fixture();
        let job = f
            .engine
            .create_job(f.company, "No takers".into(), rate(), false, None)
            .unwrap();
        f.store
            .update_driver(&f.driver, |d| {
                d.ban();
                Ok::<_, EngineError>(())
            })
            .unwrap()
            .unwrap();
        let result = f.engine.apply_to_job(job.id, f.driver);
        assert!(matches!(result, Err(EngineError::DriverUnavailable { .. })));
    }

    // ── Completion & transfer ────────────────────────────────────────

    #[test]
    fn test_validate_completion_transfers_once() {
        let f = fixture();
        make_payout_eligible(&f);
        let booking = delivered_booking(&f);

        let completed = f
            .engine
            .validate_completion(booking.id, Actor::Company(f.company))
            .unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
        assert_eq!(
            completed.transfer.as_ref().unwrap().status,
            TransferStatus::Completed
        );
        assert_eq!(f.transfers.requests().len(), 1);
        assert_eq!(f.engine.driver(&f.driver).unwrap().deliveries_completed, 1);

        // A second validation attempt conflicts and does not re-transfer.
        let again = f
            .engine
            .validate_completion(booking.id, Actor::Company(f.company));
        assert!(again.is_err());
        assert_eq!(f.transfers.requests().len(), 1);
    }

    #[test]
    fn test_completion_without_eligibility_defers_transfer() {
        let f = fixture();
        let booking = delivered_booking(&f);
        let completed = f
            .engine
            .validate_completion(booking.id, Actor::Company(f.company))
            .unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
        assert!(completed.transfer.is_none());
        assert!(f.transfers.requests().is_empty());
    }

    // ── Scenario 3: dispute resolved with CANCEL ─────────────────────

    #[test]
    fn test_dispute_cancel_refunds_and_never_transfers() {
        let f = fixture();
        make_payout_eligible(&f);
        let booking = delivered_booking(&f);

        f.engine
            .open_dispute(
                booking.id,
                Actor::Company(f.company),
                "not delivered".into(),
            )
            .unwrap();
        let (resolved, outcome) = f
            .engine
            .resolve_dispute(
                booking.id,
                AdminId::new(),
                DisputeAction::Cancel,
                "company evidence stands".into(),
            )
            .unwrap();

        assert_eq!(resolved.status, BookingStatus::Cancelled);
        assert_eq!(resolved.settlement, SettlementStatus::Refunded);
        assert_eq!(
            f.engine.job(&resolved.job_id).unwrap().status,
            JobStatus::Cancelled
        );
        assert_eq!(outcome.transfer_due, None);
        assert!(f.transfers.requests().is_empty());
    }

    #[test]
    fn test_dispute_validate_pays_driver() {
        let f = fixture();
        make_payout_eligible(&f);
        let booking = delivered_booking(&f);

        f.engine
            .open_dispute(booking.id, Actor::Company(f.company), "late".into())
            .unwrap();
        let (resolved, outcome) = f
            .engine
            .resolve_dispute(
                booking.id,
                AdminId::new(),
                DisputeAction::Validate,
                "delivery proven".into(),
            )
            .unwrap();

        assert_eq!(resolved.status, BookingStatus::Completed);
        assert_eq!(outcome.transfer_due.unwrap().minor, 35_000);
        assert_eq!(f.transfers.requests().len(), 1);
    }

    #[test]
    fn test_dispute_resolution_conflicts_on_second_attempt() {
        let f = fixture();
        make_payout_eligible(&f);
        let booking = delivered_booking(&f);
        f.engine
            .open_dispute(booking.id, Actor::Company(f.company), "x".into())
            .unwrap();
        f.engine
            .resolve_dispute(
                booking.id,
                AdminId::new(),
                DisputeAction::Validate,
                "ok".into(),
            )
            .unwrap();

        let second = f.engine.resolve_dispute(
            booking.id,
            AdminId::new(),
            DisputeAction::Cancel,
            "reversal".into(),
        );
        assert!(second.is_err());
        // First outcome intact, exactly one transfer.
        assert_eq!(
            f.engine.booking(&booking.id).unwrap().status,
            BookingStatus::Completed
        );
        assert_eq!(f.transfers.requests().len(), 1);
    }

    // ── Scenarios 4 & 5: no-show escalation ──────────────────────────

    #[test]
    fn test_first_confirmed_no_show_warns_only() {
        let f = fixture();
        let job = f
            .engine
            .create_job(f.company, "No-show run".into(), rate(), false, None)
            .unwrap();
        let booking = f.engine.apply_to_job(job.id, f.driver).unwrap();
        f.engine
            .accept_candidate(booking.id, Actor::Company(f.company))
            .unwrap();

        f.engine
            .report_no_show(
                booking.id,
                Actor::Company(f.company),
                "driver never arrived".into(),
            )
            .unwrap();
        let (resolved, sanction) = f
            .engine
            .confirm_no_show(booking.id, Actor::Admin(AdminId::new()), true, None)
            .unwrap();

        assert_eq!(resolved.status, BookingStatus::Cancelled);
        assert_eq!(f.engine.job(&job.id).unwrap().status, JobStatus::Cancelled);
        assert_eq!(sanction, Some(Sanction::Warning));
        let driver = f.engine.driver(&f.driver).unwrap();
        assert_eq!(driver.strike_count, 1);
        assert!(driver.is_available);
    }

    #[test]
    fn test_second_confirmed_no_show_suspends_driver() {
        let f = fixture();
        for n in 0..2 {
            let job = f
                .engine
                .create_job(f.company, format!("Run {n}"), rate(), false, None)
                .unwrap();
            let booking = f.engine.apply_to_job(job.id, f.driver).unwrap();
            f.engine
                .accept_candidate(booking.id, Actor::Company(f.company))
                .unwrap();
            f.engine
                .report_no_show(booking.id, Actor::Company(f.company), "absent".into())
                .unwrap();
            f.engine
                .confirm_no_show(booking.id, Actor::Admin(AdminId::new()), true, None)
                .unwrap();
        }

        let driver = f.engine.driver(&f.driver).unwrap();
        assert_eq!(driver.strike_count, 2);
        assert!(!driver.is_available);
        assert!(driver.suspended_until.is_some());

        // A suspended driver cannot apply to new work.
        let job = f
            .engine
            .create_job(f.company, "Post-suspension".into(), rate(), false, None)
            .unwrap();
        let result = f.engine.apply_to_job(job.id, f.driver);
        assert!(matches!(result, Err(EngineError::DriverUnavailable { .. })));
    }

    #[test]
    fn test_company_cannot_confirm_own_report() {
        let f = fixture();
        let job = f
            .engine
            .create_job(f.company, "Self-judged".into(), rate(), false, None)
            .unwrap();
        let booking = f.engine.apply_to_job(job.id, f.driver).unwrap();
        f.engine
            .accept_candidate(booking.id, Actor::Company(f.company))
            .unwrap();
        f.engine
            .report_no_show(booking.id, Actor::Company(f.company), "absent".into())
            .unwrap();

        let result =
            f.engine
                .confirm_no_show(booking.id, Actor::Company(f.company), true, None);
        assert!(result.is_err());
        assert_eq!(f.engine.driver(&f.driver).unwrap().strike_count, 0);
    }

    // ── Scenario 2: webhook replay against the engine's store ────────

    #[test]
    fn test_webhook_capture_replay_and_user_action_share_state() {
        let f = fixture();
        let job = f
            .engine
            .create_job(f.company, "Replayed".into(), rate(), false, None)
            .unwrap();
        let booking = f.engine.apply_to_job(job.id, f.driver).unwrap();
        f.engine
            .accept_candidate(booking.id, Actor::Company(f.company))
            .unwrap();

        let verifier = SignatureVerifier::new("whsec_engine");
        let processor = WebhookProcessor::new(f.store.clone(), verifier.clone());
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": "evt_shared",
            "type": "payment_intent.succeeded",
            "created": Timestamp::now().epoch_secs(),
            "data": {"object": {
                "id": "pi_shared",
                "status": "succeeded",
                "metadata": {"booking_id": booking.id.as_uuid().to_string()}
            }}
        }))
        .unwrap();
        let header = verifier.sign(&payload, Timestamp::now().epoch_secs());

        processor.process(&payload, &header).unwrap();
        processor.process(&payload, &header).unwrap(); // duplicate delivery

        let current = f.engine.booking(&booking.id).unwrap();
        assert_eq!(current.status, BookingStatus::InProgress);
        assert_eq!(current.settlement, SettlementStatus::Captured);

        // The user-facing flow continues from the webhook-advanced state.
        f.engine
            .mark_delivered(booking.id, Actor::Driver(f.driver), None)
            .unwrap();
        assert_eq!(
            f.engine.job(&job.id).unwrap().status,
            JobStatus::Delivered
        );
    }
}
