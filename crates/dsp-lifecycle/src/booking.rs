//! # Booking Lifecycle State Machine
//!
//! Models one driver's engagement with a job, from application through
//! completion, cancellation, or dispute.
//!
//! ## States (progress axis)
//!
//! ```text
//! Pending ──accept()──▶ Assigned ──start()/capture──▶ InProgress
//!    │                     │                              │
//!    │                     └────────mark_delivered()──────┤
//!    │                                                    ▼
//!    │                                                Delivered ──validate_completion()──▶ Completed
//!    │                                                    │
//!    └──────────────cancel() from any non-terminal────────┘──▶ Cancelled
//! ```
//!
//! ## Settlement axis
//!
//! Progress and settlement are deliberately separate enumerations.
//! "Disputed" is a settlement condition of a `Delivered` booking, not a
//! sixth progress state; a refund in flight is `RefundPending` regardless
//! of whether the booking has been cancelled yet. The
//! [`SettlementStatus::compatible_with`] table constrains which pairs may
//! coexist.
//!
//! ## Concurrency contract
//!
//! Transition methods check preconditions against `self` — the caller
//! must invoke them inside the store's atomic per-booking update so the
//! check and the write are one operation. Two racing transitions on the
//! same booking serialize there, and the loser is rejected with the
//! winner's status in the error.
//!
//! ## Design Choice: Validated Enum over Typestate
//!
//! Cancellation is reachable from four source states, bookings are
//! persisted and transmitted with the state unknown at compile time, and
//! webhook handlers must be self-idempotent (re-applying a recorded
//! settlement is a no-op, not an error). A validated enum with guarded
//! methods expresses all three directly; typestate would not.

use serde::{Deserialize, Serialize};

use dsp_core::{Actor, BookingId, CompanyId, DriverId, JobId, Money, ProviderPaymentId, Timestamp};

use crate::error::LifecycleError;
use crate::job::Job;

// ─── Progress Status ─────────────────────────────────────────────────

/// The progress status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Driver has applied; the company has not chosen a candidate.
    Pending,
    /// Company accepted this driver for the job.
    Assigned,
    /// Work has started (driver action or payment capture).
    InProgress,
    /// Driver reports the delivery performed.
    Delivered,
    /// Company (or an administrator) validated completion. Terminal.
    Completed,
    /// Engagement ended without completion. Terminal.
    Cancelled,
}

impl BookingStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Delivered => "DELIVERED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether this booking occupies the job (counts toward acceptance
    /// exclusivity): any status other than `Pending` and `Cancelled`.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Pending | Self::Cancelled)
    }

    /// Valid target statuses from this status.
    pub fn valid_transitions(&self) -> &'static [BookingStatus] {
        match self {
            Self::Pending => &[Self::Assigned, Self::Cancelled],
            Self::Assigned => &[Self::InProgress, Self::Delivered, Self::Cancelled],
            Self::InProgress => &[Self::Delivered, Self::Cancelled],
            Self::Delivered => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    /// Whether a transition to `to` is listed in the transition table.
    pub fn can_transition_to(&self, to: BookingStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Settlement Status ───────────────────────────────────────────────

/// The settlement status of a booking's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    /// No capture recorded yet.
    Unpaid,
    /// Provider captured the company's payment.
    Captured,
    /// Provider reported a failed payment. Progress is not forced to
    /// `Cancelled` — a human or a follow-up event decides.
    Failed,
    /// A refund exists at the provider but has not succeeded yet.
    RefundPending,
    /// Refund succeeded; funds returned to the company.
    Refunded,
    /// Dispute resolved with a partial refund; the remainder was
    /// transferred to the driver.
    PartiallyRefunded,
    /// Delivery is contested; settlement frozen pending administrator
    /// resolution.
    Disputed,
}

impl SettlementStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Captured => "CAPTURED",
            Self::Failed => "FAILED",
            Self::RefundPending => "REFUND_PENDING",
            Self::Refunded => "REFUNDED",
            Self::PartiallyRefunded => "PARTIALLY_REFUNDED",
            Self::Disputed => "DISPUTED",
        }
    }

    /// Whether this settlement status may coexist with the given
    /// progress status.
    ///
    /// This is the compatibility table that replaces the single
    /// overloaded status field: progress and settlement advance
    /// independently, but only these pairs are legal.
    pub fn compatible_with(&self, status: BookingStatus) -> bool {
        use BookingStatus as B;
        match self {
            Self::Unpaid => !matches!(status, B::Completed),
            Self::Captured => !matches!(status, B::Pending),
            Self::Failed => !matches!(status, B::Completed),
            Self::RefundPending => {
                matches!(status, B::Assigned | B::InProgress | B::Delivered | B::Cancelled)
            }
            Self::Refunded => matches!(status, B::Cancelled | B::Completed),
            Self::PartiallyRefunded => matches!(status, B::Completed),
            Self::Disputed => matches!(status, B::Delivered),
        }
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Transfer Marker ─────────────────────────────────────────────────

/// Outcome of the outbound fund transfer to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    /// Transfer was submitted but its outcome is unknown (e.g., the call
    /// timed out). Requires reconciliation, not a retry.
    Pending,
    /// Provider confirmed the transfer.
    Completed,
    /// Provider rejected the transfer. Requires manual intervention;
    /// never auto-retried inline.
    Failed,
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Durable record of the single fund transfer attempt for a booking.
///
/// Present iff a transfer has been initiated. Its existence is the
/// at-most-once guard: callers must check [`Booking::transfer_initiated`]
/// before submitting a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Provider-assigned transfer identifier, if the call returned one.
    pub provider_transfer_id: Option<String>,
    /// Amount transferred to the driver.
    pub amount: Money,
    /// Outcome of the transfer call.
    pub status: TransferStatus,
    /// When the transfer was initiated (UTC).
    pub initiated_at: Timestamp,
    /// Provider error message for failed transfers.
    pub error: Option<String>,
}

// ─── No-Show Marker ──────────────────────────────────────────────────

/// Resolution of a reported no-show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoShowResolution {
    /// Whether the no-show was confirmed (true) or dismissed (false).
    pub confirmed: bool,
    /// Who resolved the report: an administrator, or the driver
    /// admitting fault.
    pub resolved_by: Actor,
    /// Free-text comment from the resolver.
    pub comment: Option<String>,
    /// When the report was resolved (UTC).
    pub resolved_at: Timestamp,
}

/// A reported no-show incident on a booking.
///
/// The `resolution` field is the idempotency marker spec'd for sanction
/// application: confirmation fails once a resolution exists, so the
/// sanction engine can never be invoked twice for one incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoShowRecord {
    /// The company that reported the incident.
    pub reported_by: CompanyId,
    /// Why the company considers the driver a no-show.
    pub reason: String,
    /// When the report was filed (UTC).
    pub reported_at: Timestamp,
    /// Outcome, once an administrator or the driver resolves the report.
    pub resolution: Option<NoShowResolution>,
}

// ─── Dispute Marker ──────────────────────────────────────────────────

/// Administrator's resolution choice for a disputed delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DisputeAction {
    /// Pay the driver: booking completes, transfer proceeds.
    Validate,
    /// Refund the company: booking cancels, no transfer.
    Cancel,
    /// Refund part of the price to the company and transfer the
    /// remainder to the driver.
    PartialRefund {
        /// Amount returned to the company.
        refund: Money,
    },
}

/// The administrative decision closing a dispute. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeDecision {
    /// The chosen resolution.
    pub action: DisputeAction,
    /// The administrator who decided.
    pub decided_by: dsp_core::AdminId,
    /// Decision notes, appended verbatim to the booking's audit trail.
    pub notes: String,
    /// When the decision was recorded (UTC).
    pub decided_at: Timestamp,
}

/// A contested delivery on a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeRecord {
    /// Who contested the delivery.
    pub opened_by: Actor,
    /// Why the delivery is contested.
    pub reason: String,
    /// When the dispute was opened (UTC).
    pub opened_at: Timestamp,
    /// The administrative decision, once resolved.
    pub resolution: Option<DisputeDecision>,
}

// ─── Transition Record ───────────────────────────────────────────────

/// Record of a single booking state transition.
///
/// Every transition is logged with the acting party (absent for
/// provider-driven transitions) and the settlement status after the
/// transition, giving an append-only audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingTransitionRecord {
    /// Progress status before the transition.
    pub from_status: BookingStatus,
    /// Progress status after the transition.
    pub to_status: BookingStatus,
    /// Settlement status after the transition.
    pub settlement: SettlementStatus,
    /// When the transition occurred (UTC).
    pub timestamp: Timestamp,
    /// The acting party, if the transition was user-triggered.
    pub actor: Option<Actor>,
    /// Human-readable reason for the transition.
    pub reason: String,
}

// ─── Booking ─────────────────────────────────────────────────────────

/// One driver's engagement with a job.
///
/// Enforces the transition table, per-transition authorization, and the
/// progress/settlement compatibility constraints. All webhook-driven
/// mutations (`record_*` methods) are self-idempotent: re-applying a
/// settlement that is already recorded is a no-op, because provider
/// delivery is at-least-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// The job this booking engages.
    pub job_id: JobId,
    /// The applying driver.
    pub driver_id: DriverId,
    /// Current progress status.
    pub status: BookingStatus,
    /// Current settlement status.
    pub settlement: SettlementStatus,
    /// Price agreed at application time.
    pub agreed_price: Money,
    /// Provider payment identifier, once a payment exists.
    pub provider_payment_id: Option<ProviderPaymentId>,
    /// Raw provider payment-status string, kept verbatim for audit.
    pub provider_payment_status: Option<String>,
    /// Free-text notes from the company.
    pub company_notes: Option<String>,
    /// Free-text notes from the driver.
    pub driver_notes: Option<String>,
    /// Proof-of-delivery reference (document id, photo URL).
    pub proof_of_delivery: Option<String>,
    /// The single fund-transfer record, once initiated.
    pub transfer: Option<TransferRecord>,
    /// No-show incident marker, once reported.
    pub no_show: Option<NoShowRecord>,
    /// Dispute marker, once the delivery is contested.
    pub dispute: Option<DisputeRecord>,
    /// When the driver applied (UTC).
    pub created_at: Timestamp,
    /// When the payment was captured (UTC).
    pub paid_at: Option<Timestamp>,
    /// When the driver marked delivery (UTC).
    pub delivered_at: Option<Timestamp>,
    /// Ordered log of all state transitions.
    pub transitions: Vec<BookingTransitionRecord>,
}

impl Booking {
    /// Create a new booking in the `Pending` status.
    ///
    /// Uniqueness of the live (job, driver) pair is the store's concern;
    /// the engine checks it before persisting.
    pub fn new(job_id: JobId, driver_id: DriverId, agreed_price: Money) -> Self {
        Self {
            id: BookingId::new(),
            job_id,
            driver_id,
            status: BookingStatus::Pending,
            settlement: SettlementStatus::Unpaid,
            agreed_price,
            provider_payment_id: None,
            provider_payment_status: None,
            company_notes: None,
            driver_notes: None,
            proof_of_delivery: None,
            transfer: None,
            no_show: None,
            dispute: None,
            created_at: Timestamp::now(),
            paid_at: None,
            delivered_at: None,
            transitions: Vec::new(),
        }
    }

    // ── User-triggered transitions ───────────────────────────────────

    /// Accept this candidate (PENDING → ASSIGNED).
    ///
    /// Only the job's owning company may accept. Sibling `Pending`
    /// bookings for the same job are not auto-cancelled; they become
    /// unreachable once the job leaves `Open` (the engine rejects
    /// accepting a candidate on a non-open job).
    pub fn accept(&mut self, actor: &Actor, job: &Job) -> Result<(), LifecycleError> {
        if !actor.is_company(&job.company_id) {
            return Err(self.forbidden(actor, "accept this candidate"));
        }
        self.require_status(BookingStatus::Pending, BookingStatus::Assigned)?;
        self.do_transition(BookingStatus::Assigned, Some(*actor), "candidate accepted");
        Ok(())
    }

    /// Driver starts work (ASSIGNED → IN_PROGRESS).
    pub fn start(&mut self, actor: &Actor) -> Result<(), LifecycleError> {
        if !actor.is_driver(&self.driver_id) {
            return Err(self.forbidden(actor, "start this booking"));
        }
        self.require_status(BookingStatus::Assigned, BookingStatus::InProgress)?;
        self.do_transition(BookingStatus::InProgress, Some(*actor), "driver started work");
        Ok(())
    }

    /// Driver marks the delivery performed (ASSIGNED | IN_PROGRESS → DELIVERED).
    pub fn mark_delivered(
        &mut self,
        actor: &Actor,
        proof: Option<String>,
    ) -> Result<(), LifecycleError> {
        if !actor.is_driver(&self.driver_id) {
            return Err(self.forbidden(actor, "mark this booking delivered"));
        }
        if !matches!(
            self.status,
            BookingStatus::Assigned | BookingStatus::InProgress
        ) {
            return Err(self.invalid_transition(BookingStatus::Delivered));
        }
        self.proof_of_delivery = proof;
        self.delivered_at = Some(Timestamp::now());
        self.do_transition(BookingStatus::Delivered, Some(*actor), "delivery reported");
        Ok(())
    }

    /// Company validates the completed delivery (DELIVERED → COMPLETED).
    ///
    /// Requires captured funds: under the pay-at-selection flow a
    /// delivered booking without a capture indicates a reconciliation
    /// problem, and completing it would promise a transfer that cannot
    /// be funded. Disputed bookings must go through the resolver instead.
    pub fn validate_completion(&mut self, actor: &Actor, job: &Job) -> Result<(), LifecycleError> {
        if !(actor.is_company(&job.company_id) || actor.is_admin()) {
            return Err(self.forbidden(actor, "validate this booking"));
        }
        self.require_status(BookingStatus::Delivered, BookingStatus::Completed)?;
        match self.settlement {
            SettlementStatus::Captured => {}
            SettlementStatus::Disputed => return Err(LifecycleError::AlreadyDisputed),
            other => return Err(LifecycleError::PaymentNotCaptured { settlement: other }),
        }
        self.do_transition(BookingStatus::Completed, Some(*actor), "completion validated");
        Ok(())
    }

    /// Cancel the booking (any non-terminal status → CANCELLED).
    ///
    /// Only the job's owning company or an administrator may cancel.
    /// Captured funds flip to `RefundPending` — the refund itself is
    /// confirmed later by the provider's refund-succeeded event.
    pub fn cancel(
        &mut self,
        actor: &Actor,
        job: &Job,
        reason: impl Into<String>,
    ) -> Result<(), LifecycleError> {
        if !(actor.is_company(&job.company_id) || actor.is_admin()) {
            return Err(self.forbidden(actor, "cancel this booking"));
        }
        self.force_cancel(Some(*actor), reason)
    }

    // ── No-show flow ─────────────────────────────────────────────────

    /// Company reports a driver no-show on an accepted booking.
    ///
    /// Rejected if an unresolved report already exists. A dismissed
    /// report may be superseded by a new one.
    pub fn report_no_show(
        &mut self,
        actor: &Actor,
        job: &Job,
        reason: impl Into<String>,
    ) -> Result<(), LifecycleError> {
        if !actor.is_company(&job.company_id) {
            return Err(self.forbidden(actor, "report a no-show on this booking"));
        }
        if !matches!(
            self.status,
            BookingStatus::Assigned | BookingStatus::InProgress
        ) {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                to: BookingStatus::Cancelled,
                reason: "no-show can only be reported on an accepted, unfinished booking"
                    .to_string(),
            });
        }
        if let Some(record) = &self.no_show {
            if record.resolution.is_none() {
                return Err(LifecycleError::NoShowAlreadyReported);
            }
        }
        self.no_show = Some(NoShowRecord {
            reported_by: job.company_id,
            reason: reason.into(),
            reported_at: Timestamp::now(),
            resolution: None,
        });
        Ok(())
    }

    /// Resolve a reported no-show.
    ///
    /// An administrator may confirm or dismiss; the booking's driver may
    /// only confirm (admit fault). The reporting company may not resolve
    /// its own report. Confirmation cancels the booking and returns
    /// `true` — the caller applies the driver sanction exactly once,
    /// relying on this method's conflict check for idempotency.
    pub fn resolve_no_show(
        &mut self,
        actor: &Actor,
        confirmed: bool,
        comment: Option<String>,
    ) -> Result<bool, LifecycleError> {
        let record = self.no_show.as_ref().ok_or(LifecycleError::NoShowNotReported)?;
        if record.resolution.is_some() {
            return Err(LifecycleError::NoShowAlreadyResolved);
        }
        let may_resolve = actor.is_admin() || (actor.is_driver(&self.driver_id) && confirmed);
        if !may_resolve {
            return Err(self.forbidden(actor, "resolve this no-show report"));
        }

        let resolution = NoShowResolution {
            confirmed,
            resolved_by: *actor,
            comment,
            resolved_at: Timestamp::now(),
        };
        // Presence checked above.
        if let Some(record) = self.no_show.as_mut() {
            record.resolution = Some(resolution);
        }

        if confirmed {
            self.force_cancel(Some(*actor), "no-show confirmed")?;
        }
        Ok(confirmed)
    }

    // ── Dispute flow ─────────────────────────────────────────────────

    /// Contest a delivered booking (settlement → DISPUTED).
    ///
    /// Only the job's owning company or an administrator may open a
    /// dispute, and only while the booking is `Delivered` with captured
    /// funds.
    pub fn open_dispute(
        &mut self,
        actor: &Actor,
        job: &Job,
        reason: impl Into<String>,
    ) -> Result<(), LifecycleError> {
        if !(actor.is_company(&job.company_id) || actor.is_admin()) {
            return Err(self.forbidden(actor, "open a dispute on this booking"));
        }
        if self.status != BookingStatus::Delivered {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                to: self.status,
                reason: "only a delivered booking can be disputed".to_string(),
            });
        }
        match self.settlement {
            SettlementStatus::Disputed => return Err(LifecycleError::AlreadyDisputed),
            SettlementStatus::Captured => {}
            other => return Err(LifecycleError::PaymentNotCaptured { settlement: other }),
        }
        self.dispute = Some(DisputeRecord {
            opened_by: *actor,
            reason: reason.into(),
            opened_at: Timestamp::now(),
            resolution: None,
        });
        self.settlement = SettlementStatus::Disputed;
        Ok(())
    }

    /// Apply an administrator's dispute resolution.
    ///
    /// Fails unless the booking is currently disputed, and fails on a
    /// second invocation — the first decision is immutable.
    pub fn resolve_dispute(
        &mut self,
        admin: dsp_core::AdminId,
        action: DisputeAction,
        notes: impl Into<String>,
    ) -> Result<(), LifecycleError> {
        if self.settlement != SettlementStatus::Disputed {
            return Err(LifecycleError::NotDisputed {
                settlement: self.settlement,
            });
        }
        let record = self.dispute.as_ref().ok_or(LifecycleError::NotDisputed {
            settlement: self.settlement,
        })?;
        if record.resolution.is_some() {
            return Err(LifecycleError::DisputeAlreadyResolved);
        }

        let actor = Actor::Admin(admin);
        match &action {
            DisputeAction::Validate => {
                self.settlement = SettlementStatus::Captured;
                self.do_transition(
                    BookingStatus::Completed,
                    Some(actor),
                    "dispute resolved: validated",
                );
            }
            DisputeAction::Cancel => {
                self.settlement = SettlementStatus::Refunded;
                self.do_transition(
                    BookingStatus::Cancelled,
                    Some(actor),
                    "dispute resolved: cancelled and refunded",
                );
            }
            DisputeAction::PartialRefund { .. } => {
                self.settlement = SettlementStatus::PartiallyRefunded;
                self.do_transition(
                    BookingStatus::Completed,
                    Some(actor),
                    "dispute resolved: partial refund",
                );
            }
        }

        // Presence checked above.
        if let Some(record) = self.dispute.as_mut() {
            record.resolution = Some(DisputeDecision {
                action,
                decided_by: admin,
                notes: notes.into(),
                decided_at: Timestamp::now(),
            });
        }
        Ok(())
    }

    // ── Provider-driven settlement updates (self-idempotent) ─────────

    /// Record a successful payment capture.
    ///
    /// Sets settlement to `Captured`, stamps `paid_at` once, and
    /// advances progress per the pay-at-selection flow: a capture
    /// confirms the assignment (`Pending → Assigned` if the acceptance
    /// is still in flight) and funds the work (`Assigned →
    /// InProgress`). Returns `true` if the progress status advanced.
    /// A duplicate capture is a no-op returning `false`.
    pub fn record_payment_captured(
        &mut self,
        payment_id: ProviderPaymentId,
        raw_status: impl Into<String>,
    ) -> Result<bool, LifecycleError> {
        self.provider_payment_id = Some(payment_id);
        self.provider_payment_status = Some(raw_status.into());

        if !matches!(
            self.settlement,
            SettlementStatus::Unpaid | SettlementStatus::Failed
        ) {
            // Already captured (or further along); at-least-once delivery.
            return Ok(false);
        }
        self.settlement = SettlementStatus::Captured;
        if self.paid_at.is_none() {
            self.paid_at = Some(Timestamp::now());
        }
        match self.status {
            // Payment implies the company selected this driver; the
            // capture may outrun the acceptance write.
            BookingStatus::Pending => {
                self.do_transition(BookingStatus::Assigned, None, "payment captured");
                Ok(true)
            }
            BookingStatus::Assigned => {
                self.do_transition(BookingStatus::InProgress, None, "payment captured");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Record a failed payment. Progress is untouched.
    pub fn record_payment_failed(&mut self, raw_status: impl Into<String>) {
        self.provider_payment_status = Some(raw_status.into());
        if matches!(
            self.settlement,
            SettlementStatus::Unpaid | SettlementStatus::Captured
        ) {
            self.settlement = SettlementStatus::Failed;
        }
    }

    /// Record an intermediate refund state (created/updated). Only a
    /// terminal refund-succeeded event forces cancellation.
    pub fn record_refund_pending(&mut self, raw_status: impl Into<String>) {
        self.provider_payment_status = Some(raw_status.into());
        if !matches!(
            self.settlement,
            SettlementStatus::Refunded | SettlementStatus::PartiallyRefunded
        ) {
            self.settlement = SettlementStatus::RefundPending;
        }
    }

    /// Record a succeeded refund: settlement → `Refunded`, and a
    /// non-terminal booking is cancelled. Returns `true` if the progress
    /// status changed. A refund landing on an already-`Completed` booking
    /// only updates settlement; the caller logs it for reconciliation.
    pub fn record_refund_succeeded(
        &mut self,
        raw_status: impl Into<String>,
    ) -> Result<bool, LifecycleError> {
        self.provider_payment_status = Some(raw_status.into());
        if self.settlement == SettlementStatus::Refunded {
            return Ok(false);
        }
        self.settlement = SettlementStatus::Refunded;
        if !self.status.is_terminal() {
            self.force_cancel(None, "refund succeeded")?;
            return Ok(true);
        }
        Ok(false)
    }

    // ── Transfer marker ──────────────────────────────────────────────

    /// Whether a fund transfer has already been initiated.
    pub fn transfer_initiated(&self) -> bool {
        self.transfer.is_some()
    }

    /// Record the outcome of the single transfer attempt.
    ///
    /// Rejected if a transfer record already exists — callers must check
    /// [`transfer_initiated`](Self::transfer_initiated) before submitting
    /// to the provider.
    pub fn record_transfer(&mut self, record: TransferRecord) -> Result<(), LifecycleError> {
        if self.transfer.is_some() {
            return Err(LifecycleError::TransferAlreadyInitiated);
        }
        self.transfer = Some(record);
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Cancel from any non-terminal status, adjusting settlement.
    fn force_cancel(
        &mut self,
        actor: Option<Actor>,
        reason: impl Into<String>,
    ) -> Result<(), LifecycleError> {
        if self.status.is_terminal() {
            return Err(LifecycleError::AlreadyTerminal {
                status: self.status,
            });
        }
        // Captured funds must flow back; the provider confirms later.
        if self.settlement == SettlementStatus::Captured
            || self.settlement == SettlementStatus::Disputed
        {
            self.settlement = SettlementStatus::RefundPending;
        }
        self.do_transition(BookingStatus::Cancelled, actor, reason);
        Ok(())
    }

    /// Validate that the booking is in the expected status.
    fn require_status(
        &self,
        expected: BookingStatus,
        target: BookingStatus,
    ) -> Result<(), LifecycleError> {
        if self.status.is_terminal() {
            return Err(LifecycleError::AlreadyTerminal {
                status: self.status,
            });
        }
        if self.status != expected {
            return Err(self.invalid_transition(target));
        }
        Ok(())
    }

    fn invalid_transition(&self, to: BookingStatus) -> LifecycleError {
        LifecycleError::InvalidTransition {
            from: self.status,
            to,
            reason: format!("not allowed from {}", self.status),
        }
    }

    fn forbidden(&self, actor: &Actor, action: &str) -> LifecycleError {
        LifecycleError::Forbidden {
            actor: actor.to_string(),
            action: action.to_string(),
        }
    }

    /// Record a progress transition.
    fn do_transition(
        &mut self,
        to: BookingStatus,
        actor: Option<Actor>,
        reason: impl Into<String>,
    ) {
        self.transitions.push(BookingTransitionRecord {
            from_status: self.status,
            to_status: to,
            settlement: self.settlement,
            timestamp: Timestamp::now(),
            actor,
            reason: reason.into(),
        });
        self.status = to;
        debug_assert!(
            self.settlement.compatible_with(self.status),
            "incompatible pair: {} / {}",
            self.status,
            self.settlement
        );
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
