//! # Driver Operating Record
//!
//! Availability, payout eligibility, delivery count, and the typed
//! sanction state. The sanction fields (`strike_count`,
//! `suspended_until`, `banned`) are mutated only through the sanction
//! engine, under the store's atomic driver update.
//!
//! Invariant: `is_available` is false whenever a suspension or ban is
//! active. The setters here enforce it; there is no path that marks a
//! suspended or banned driver available.

use serde::{Deserialize, Serialize};

use dsp_core::{DriverId, Timestamp};

/// A driver's operating record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
    /// The driver this record belongs to.
    pub id: DriverId,
    /// Whether the driver is visible to job matching.
    pub is_available: bool,
    /// Whether the provider has verified the driver's payout account.
    pub payout_eligible: bool,
    /// Confirmed no-show count. Monotonically non-decreasing; only an
    /// explicit administrative reset (out of scope here) may lower it.
    pub strike_count: u32,
    /// End of the active suspension window, if one is in force.
    pub suspended_until: Option<Timestamp>,
    /// Whether the driver is permanently banned.
    pub banned: bool,
    /// Number of validated deliveries.
    pub deliveries_completed: u32,
    /// Average review score, maintained by the review collaborator.
    pub rating: Option<f32>,
    /// When the record was created (UTC).
    pub created_at: Timestamp,
}

impl DriverProfile {
    /// Create a fresh, available record for a new driver.
    pub fn new(id: DriverId) -> Self {
        Self {
            id,
            is_available: true,
            payout_eligible: false,
            strike_count: 0,
            suspended_until: None,
            banned: false,
            deliveries_completed: 0,
            rating: None,
            created_at: Timestamp::now(),
        }
    }

    /// Whether a suspension is active at `now`.
    pub fn is_suspended(&self, now: Timestamp) -> bool {
        match self.suspended_until {
            Some(until) => now < until,
            None => false,
        }
    }

    /// Increment the strike count by exactly one, returning the new count.
    pub fn add_strike(&mut self) -> u32 {
        self.strike_count += 1;
        self.strike_count
    }

    /// Suspend the driver until the given instant.
    pub fn suspend_until(&mut self, until: Timestamp) {
        self.suspended_until = Some(until);
        self.is_available = false;
    }

    /// Permanently ban the driver. A ban has no expiry.
    pub fn ban(&mut self) {
        self.banned = true;
        self.suspended_until = None;
        self.is_available = false;
    }

    /// Record a validated delivery.
    pub fn record_delivery(&mut self) {
        self.deliveries_completed += 1;
    }

    /// Mark the payout account as verified by the provider.
    pub fn mark_payout_eligible(&mut self) {
        self.payout_eligible = true;
    }
}
