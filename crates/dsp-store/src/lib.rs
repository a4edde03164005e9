//! # dsp-store — Entity Store Contract & In-Memory Implementation
//!
//! The engine and the webhook processor mutate entities exclusively
//! through [`MarketStore`]. The contract is deliberately narrow — the
//! two properties the rest of the stack depends on are:
//!
//! 1. **Atomic per-entity read-modify-write.** Every `update_*` method
//!    runs its closure while holding the entity (and, for multi-entity
//!    updates, each involved entity) exclusively. Transition guards
//!    evaluated inside the closure therefore see the current persisted
//!    state, and one of two racing transitions is rejected rather than
//!    silently overwritten.
//!
//! 2. **Unique webhook-event insert.** [`MarketStore::insert_event`]
//!    fails on a duplicate provider event id. This is the sole
//!    deduplication mechanism for webhook concurrency: two concurrent
//!    deliveries of one event id result in exactly one handler
//!    execution.
//!
//! The update methods return `Result<Result<T, E>, StoreError>`: the
//! outer layer reports storage failures (entity not found), the inner
//! layer carries the closure's domain result untouched.
//!
//! [`MemoryStore`] is the in-memory implementation backing the
//! development server and the test suite; the relational implementation
//! is owned by the deployment.

pub mod event;
pub mod memory;

pub use event::{WebhookEventRecord, WebhookOutcome};
pub use memory::MemoryStore;

use thiserror::Error;

use dsp_core::{BookingId, DriverId, JobId, ProviderEventId, UserId};
use dsp_lifecycle::{Booking, DriverProfile, Job};
use dsp_quota::Subscription;

/// Storage-level failures.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of the missing entity.
        entity: &'static str,
        /// Display form of the identifier.
        id: String,
    },

    /// A live (non-cancelled) booking already exists for this
    /// (job, driver) pair.
    #[error("a live booking already exists for {job} and {driver}")]
    DuplicateBooking {
        /// The job applied to.
        job: JobId,
        /// The applying driver.
        driver: DriverId,
    },

    /// The provider event id has been seen before.
    #[error("duplicate provider event: {0}")]
    DuplicateEvent(ProviderEventId),
}

/// The entity-store contract.
///
/// Multi-entity update methods lock in a fixed order
/// (booking → job → driver) so concurrent updates cannot deadlock.
pub trait MarketStore: Send + Sync + 'static {
    // ── Jobs ─────────────────────────────────────────────────────────

    /// Persist a new job.
    fn insert_job(&self, job: Job) -> Result<(), StoreError>;

    /// Fetch a job by id.
    fn get_job(&self, id: &JobId) -> Result<Job, StoreError>;

    /// Atomically read-modify-write a job.
    fn update_job<T, E>(
        &self,
        id: &JobId,
        f: impl FnOnce(&mut Job) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError>;

    // ── Bookings ─────────────────────────────────────────────────────

    /// Persist a new booking, enforcing at most one live booking per
    /// (job, driver) pair.
    fn insert_booking(&self, booking: Booking) -> Result<(), StoreError>;

    /// Fetch a booking by id.
    fn get_booking(&self, id: &BookingId) -> Result<Booking, StoreError>;

    /// All bookings for a job, in insertion order.
    fn bookings_for_job(&self, job: &JobId) -> Vec<Booking>;

    /// Atomically read-modify-write a booking.
    fn update_booking<T, E>(
        &self,
        id: &BookingId,
        f: impl FnOnce(&mut Booking) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError>;

    /// Atomically read-modify-write a booking together with its job —
    /// the write path for every transition that mirrors onto the job.
    fn update_booking_and_job<T, E>(
        &self,
        id: &BookingId,
        f: impl FnOnce(&mut Booking, &mut Job) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError>;

    /// Atomically read-modify-write a booking, its job, and its driver
    /// profile — the write path for confirmed no-shows.
    fn update_incident<T, E>(
        &self,
        id: &BookingId,
        f: impl FnOnce(&mut Booking, &mut Job, &mut DriverProfile) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError>;

    // ── Drivers ──────────────────────────────────────────────────────

    /// Persist a new driver profile.
    fn insert_driver(&self, driver: DriverProfile) -> Result<(), StoreError>;

    /// Fetch a driver profile by id.
    fn get_driver(&self, id: &DriverId) -> Result<DriverProfile, StoreError>;

    /// Atomically read-modify-write a driver profile.
    fn update_driver<T, E>(
        &self,
        id: &DriverId,
        f: impl FnOnce(&mut DriverProfile) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError>;

    // ── Subscriptions ────────────────────────────────────────────────

    /// Fetch a user's subscription, if one is stored.
    fn get_subscription(&self, user: &UserId) -> Option<Subscription>;

    /// Persist (or replace) a subscription.
    fn put_subscription(&self, subscription: Subscription);

    /// Atomically read-modify-write a user's subscription, creating an
    /// implicit free-tier row if none exists yet.
    fn update_subscription<T, E>(
        &self,
        user: &UserId,
        f: impl FnOnce(&mut Subscription) -> Result<T, E>,
    ) -> Result<T, E>;

    // ── Webhook events ───────────────────────────────────────────────

    /// Insert a webhook event record keyed by the provider event id.
    ///
    /// Fails with [`StoreError::DuplicateEvent`] if the id was seen
    /// before — the idempotency guard.
    fn insert_event(&self, record: WebhookEventRecord) -> Result<(), StoreError>;

    /// Fetch an event record by provider event id.
    fn get_event(&self, id: &ProviderEventId) -> Result<WebhookEventRecord, StoreError>;

    /// Record the final outcome of an event's handler.
    fn mark_event(&self, id: &ProviderEventId, outcome: WebhookOutcome) -> Result<(), StoreError>;
}
