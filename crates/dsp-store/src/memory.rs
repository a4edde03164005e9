//! # In-Memory Store
//!
//! DashMap-backed [`MarketStore`] implementation. Each entity type gets
//! its own map; DashMap's per-key exclusive references provide the
//! atomic read-modify-write the contract requires. Data is lost on
//! restart — production deployments bring their own relational
//! implementation.
//!
//! Multi-entity updates acquire guards in the fixed order
//! booking → job → driver. All callers go through this module, so the
//! order is global and the maps are distinct, which rules out deadlock.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use dsp_core::{BookingId, DriverId, JobId, ProviderEventId, UserId};
use dsp_lifecycle::{Booking, BookingStatus, DriverProfile, Job};
use dsp_quota::{PlanTier, Subscription};

use crate::event::{WebhookEventRecord, WebhookOutcome};
use crate::{MarketStore, StoreError};

/// Inner storage holding all maps.
struct Inner {
    jobs: DashMap<JobId, Job>,
    bookings: DashMap<BookingId, Booking>,
    /// Uniqueness index for live (job, driver) pairs.
    live_pairs: DashMap<(JobId, DriverId), BookingId>,
    drivers: DashMap<DriverId, DriverProfile>,
    subscriptions: DashMap<UserId, Subscription>,
    events: DashMap<ProviderEventId, WebhookEventRecord>,
}

/// In-memory entity store.
///
/// Cheaply cloneable via `Arc` — all clones share the same data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: DashMap::new(),
                bookings: DashMap::new(),
                live_pairs: DashMap::new(),
                drivers: DashMap::new(),
                subscriptions: DashMap::new(),
                events: DashMap::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(entity: &'static str, id: impl std::fmt::Display) -> StoreError {
    StoreError::NotFound {
        entity,
        id: id.to_string(),
    }
}

impl MarketStore for MemoryStore {
    // ── Jobs ─────────────────────────────────────────────────────────

    fn insert_job(&self, job: Job) -> Result<(), StoreError> {
        self.inner.jobs.insert(job.id, job);
        Ok(())
    }

    fn get_job(&self, id: &JobId) -> Result<Job, StoreError> {
        self.inner
            .jobs
            .get(id)
            .map(|j| j.clone())
            .ok_or_else(|| not_found("job", id))
    }

    fn update_job<T, E>(
        &self,
        id: &JobId,
        f: impl FnOnce(&mut Job) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError> {
        let mut job = self
            .inner
            .jobs
            .get_mut(id)
            .ok_or_else(|| not_found("job", id))?;
        Ok(f(job.value_mut()))
    }

    // ── Bookings ─────────────────────────────────────────────────────

    fn insert_booking(&self, booking: Booking) -> Result<(), StoreError> {
        let pair = (booking.job_id, booking.driver_id);
        match self.inner.live_pairs.entry(pair) {
            Entry::Occupied(mut occupied) => {
                let existing = *occupied.get();
                let live = self
                    .inner
                    .bookings
                    .get(&existing)
                    .map(|b| b.status != BookingStatus::Cancelled)
                    .unwrap_or(false);
                if live {
                    return Err(StoreError::DuplicateBooking {
                        job: booking.job_id,
                        driver: booking.driver_id,
                    });
                }
                occupied.insert(booking.id);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(booking.id);
            }
        }
        self.inner.bookings.insert(booking.id, booking);
        Ok(())
    }

    fn get_booking(&self, id: &BookingId) -> Result<Booking, StoreError> {
        self.inner
            .bookings
            .get(id)
            .map(|b| b.clone())
            .ok_or_else(|| not_found("booking", id))
    }

    fn bookings_for_job(&self, job: &JobId) -> Vec<Booking> {
        let mut found: Vec<Booking> = self
            .inner
            .bookings
            .iter()
            .filter(|entry| entry.job_id == *job)
            .map(|entry| entry.clone())
            .collect();
        found.sort_by_key(|b| b.created_at);
        found
    }

    fn update_booking<T, E>(
        &self,
        id: &BookingId,
        f: impl FnOnce(&mut Booking) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError> {
        let mut booking = self
            .inner
            .bookings
            .get_mut(id)
            .ok_or_else(|| not_found("booking", id))?;
        Ok(f(booking.value_mut()))
    }

    fn update_booking_and_job<T, E>(
        &self,
        id: &BookingId,
        f: impl FnOnce(&mut Booking, &mut Job) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError> {
        let mut booking = self
            .inner
            .bookings
            .get_mut(id)
            .ok_or_else(|| not_found("booking", id))?;
        let job_id = booking.job_id;
        let mut job = self
            .inner
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| not_found("job", job_id))?;
        Ok(f(booking.value_mut(), job.value_mut()))
    }

    fn update_incident<T, E>(
        &self,
        id: &BookingId,
        f: impl FnOnce(&mut Booking, &mut Job, &mut DriverProfile) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError> {
        let mut booking = self
            .inner
            .bookings
            .get_mut(id)
            .ok_or_else(|| not_found("booking", id))?;
        let job_id = booking.job_id;
        let driver_id = booking.driver_id;
        let mut job = self
            .inner
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| not_found("job", job_id))?;
        let mut driver = self
            .inner
            .drivers
            .get_mut(&driver_id)
            .ok_or_else(|| not_found("driver", driver_id))?;
        Ok(f(booking.value_mut(), job.value_mut(), driver.value_mut()))
    }

    // ── Drivers ──────────────────────────────────────────────────────

    fn insert_driver(&self, driver: DriverProfile) -> Result<(), StoreError> {
        self.inner.drivers.insert(driver.id, driver);
        Ok(())
    }

    fn get_driver(&self, id: &DriverId) -> Result<DriverProfile, StoreError> {
        self.inner
            .drivers
            .get(id)
            .map(|d| d.clone())
            .ok_or_else(|| not_found("driver", id))
    }

    fn update_driver<T, E>(
        &self,
        id: &DriverId,
        f: impl FnOnce(&mut DriverProfile) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError> {
        let mut driver = self
            .inner
            .drivers
            .get_mut(id)
            .ok_or_else(|| not_found("driver", id))?;
        Ok(f(driver.value_mut()))
    }

    // ── Subscriptions ────────────────────────────────────────────────

    fn get_subscription(&self, user: &UserId) -> Option<Subscription> {
        self.inner.subscriptions.get(user).map(|s| s.clone())
    }

    fn put_subscription(&self, subscription: Subscription) {
        self.inner
            .subscriptions
            .insert(subscription.user_id, subscription);
    }

    fn update_subscription<T, E>(
        &self,
        user: &UserId,
        f: impl FnOnce(&mut Subscription) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut subscription = self
            .inner
            .subscriptions
            .entry(*user)
            .or_insert_with(|| Subscription::new(*user, PlanTier::Free));
        f(subscription.value_mut())
    }

    // ── Webhook events ───────────────────────────────────────────────

    fn insert_event(&self, record: WebhookEventRecord) -> Result<(), StoreError> {
        match self.inner.events.entry(record.event_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEvent(record.event_id)),
            Entry::Vacant(vacant) => {
                vacant.insert(record);
                Ok(())
            }
        }
    }

    fn get_event(&self, id: &ProviderEventId) -> Result<WebhookEventRecord, StoreError> {
        self.inner
            .events
            .get(id)
            .map(|e| e.clone())
            .ok_or_else(|| not_found("webhook event", id))
    }

    fn mark_event(&self, id: &ProviderEventId, outcome: WebhookOutcome) -> Result<(), StoreError> {
        let mut event = self
            .inner
            .events
            .get_mut(id)
            .ok_or_else(|| not_found("webhook event", id))?;
        event.outcome = outcome;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsp_core::{Actor, CompanyId, Money};
    use dsp_lifecycle::LifecycleError;

    fn seeded() -> (MemoryStore, Job, Booking) {
        let store = MemoryStore::new();
        let job = Job::new(
            CompanyId::new(),
            "Store test run",
            Money::new(10_000, "EUR").unwrap(),
            false,
            None,
        );
        let booking = Booking::new(job.id, DriverId::new(), Money::new(10_000, "EUR").unwrap());
        store.insert_job(job.clone()).unwrap();
        store.insert_booking(booking.clone()).unwrap();
        (store, job, booking)
    }

    #[test]
    fn test_get_missing_job_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_job(&JobId::new()),
            Err(StoreError::NotFound { entity: "job", .. })
        ));
    }

    #[test]
    fn test_duplicate_live_pair_rejected() {
        let (store, job, booking) = seeded();
        let second = Booking::new(job.id, booking.driver_id, Money::new(10_000, "EUR").unwrap());
        let result = store.insert_booking(second);
        assert!(matches!(result, Err(StoreError::DuplicateBooking { .. })));
    }

    #[test]
    fn test_cancelled_pair_may_reapply() {
        let (store, job, booking) = seeded();
        store
            .update_booking_and_job(&booking.id, |b, j| {
                b.cancel(&Actor::Company(job.company_id), j, "withdrawn")?;
                j.mirror_booking(b.status);
                Ok::<_, LifecycleError>(())
            })
            .unwrap()
            .unwrap();

        let second = Booking::new(job.id, booking.driver_id, Money::new(10_000, "EUR").unwrap());
        store.insert_booking(second).unwrap();
    }

    #[test]
    fn test_update_persists_mutation() {
        let (store, job, booking) = seeded();
        store
            .update_booking_and_job(&booking.id, |b, j| {
                b.accept(&Actor::Company(job.company_id), j)?;
                j.mirror_booking(b.status);
                Ok::<_, LifecycleError>(())
            })
            .unwrap()
            .unwrap();

        let stored = store.get_booking(&booking.id).unwrap();
        assert_eq!(stored.status, BookingStatus::Assigned);
        assert_eq!(
            store.get_job(&job.id).unwrap().status,
            dsp_lifecycle::JobStatus::Assigned
        );
    }

    #[test]
    fn test_racing_transitions_serialize() {
        let (store, job, booking) = seeded();
        let company = Actor::Company(job.company_id);

        // Two threads race to accept the same booking; exactly one wins.
        let results: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let store = store.clone();
                    let company = company;
                    let id = booking.id;
                    scope.spawn(move || {
                        store
                            .update_booking_and_job(&id, |b, j| {
                                b.accept(&company, j)?;
                                j.mirror_booking(b.status);
                                Ok::<_, LifecycleError>(())
                            })
                            .unwrap()
                            .is_ok()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
        assert_eq!(
            store.get_booking(&booking.id).unwrap().status,
            BookingStatus::Assigned
        );
    }

    #[test]
    fn test_duplicate_event_rejected() {
        let store = MemoryStore::new();
        let record = WebhookEventRecord::pending(
            ProviderEventId::new("evt_1"),
            "payment_intent.succeeded",
            serde_json::json!({}),
        );
        store.insert_event(record.clone()).unwrap();
        assert!(matches!(
            store.insert_event(record),
            Err(StoreError::DuplicateEvent(_))
        ));
    }

    #[test]
    fn test_concurrent_event_insert_admits_one() {
        let store = MemoryStore::new();
        let results: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let store = store.clone();
                    scope.spawn(move || {
                        store
                            .insert_event(WebhookEventRecord::pending(
                                ProviderEventId::new("evt_race"),
                                "charge.refunded",
                                serde_json::json!({}),
                            ))
                            .is_ok()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
    }

    #[test]
    fn test_mark_event_outcome() {
        let store = MemoryStore::new();
        let id = ProviderEventId::new("evt_2");
        store
            .insert_event(WebhookEventRecord::pending(
                id.clone(),
                "refund.succeeded",
                serde_json::json!({}),
            ))
            .unwrap();
        store.mark_event(&id, WebhookOutcome::Processed).unwrap();
        assert_eq!(
            store.get_event(&id).unwrap().outcome,
            WebhookOutcome::Processed
        );
    }

    #[test]
    fn test_subscription_implicit_free_tier() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let tier = store.update_subscription(&user, |sub| Ok::<_, ()>(sub.tier));
        assert_eq!(tier.unwrap(), PlanTier::Free);
        assert!(store.get_subscription(&user).is_some());
    }
}
