//! # Plans and Subscriptions
//!
//! Plan limits are `Option<u32>` per action — `None` means unlimited.
//! The free tier is implicit: a user with no stored subscription gets
//! [`PlanLimits::FREE_TIER`].

use serde::{Deserialize, Serialize};

use dsp_core::{Timestamp, UserId};

// ─── Plan Limits ─────────────────────────────────────────────────────

/// Monthly action limits for a plan. `None` = unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Jobs a company may publish per billing period.
    pub max_jobs_per_month: Option<u32>,
    /// Applications a driver may submit per billing period.
    pub max_applications_per_month: Option<u32>,
}

impl PlanLimits {
    /// Limits applied to users with no active subscription.
    pub const FREE_TIER: PlanLimits = PlanLimits {
        max_jobs_per_month: Some(1),
        max_applications_per_month: Some(5),
    };

    /// Limits with no caps on either action.
    pub const UNLIMITED: PlanLimits = PlanLimits {
        max_jobs_per_month: None,
        max_applications_per_month: None,
    };
}

// ─── Plan Tier ───────────────────────────────────────────────────────

/// Named subscription tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    /// Implicit tier for users without a subscription.
    Free,
    /// Entry paid tier.
    Starter,
    /// Unlimited paid tier.
    Pro,
}

impl PlanTier {
    /// The limits attached to this tier.
    pub fn limits(&self) -> PlanLimits {
        match self {
            Self::Free => PlanLimits::FREE_TIER,
            Self::Starter => PlanLimits {
                max_jobs_per_month: Some(10),
                max_applications_per_month: Some(50),
            },
            Self::Pro => PlanLimits::UNLIMITED,
        }
    }

    /// The canonical string name of this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Billing Status ──────────────────────────────────────────────────

/// Billing status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    /// Paid up for the current period.
    Active,
    /// Payment overdue; treated as free tier until settled.
    PastDue,
    /// Cancelled by the user; treated as free tier.
    Cancelled,
}

// ─── Subscription ────────────────────────────────────────────────────

/// A user's subscription with its monthly usage counters.
///
/// Counters belong to the current billing period and reset only on
/// [`Subscription::roll_period`], which the renewal flow calls when the
/// provider confirms the next period's payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// The subscribing user.
    pub user_id: UserId,
    /// The subscribed tier.
    pub tier: PlanTier,
    /// Billing status for the current period.
    pub billing_status: BillingStatus,
    /// Start of the current billing period (UTC).
    pub period_start: Timestamp,
    /// Jobs published this period.
    pub jobs_published: u32,
    /// Applications submitted this period.
    pub applications_submitted: u32,
}

impl Subscription {
    /// Create an active subscription starting a fresh billing period.
    pub fn new(user_id: UserId, tier: PlanTier) -> Self {
        Self {
            user_id,
            tier,
            billing_status: BillingStatus::Active,
            period_start: Timestamp::now(),
            jobs_published: 0,
            applications_submitted: 0,
        }
    }

    /// Effective limits: the tier's limits while billing is active,
    /// free-tier limits otherwise.
    pub fn effective_limits(&self) -> PlanLimits {
        match self.billing_status {
            BillingStatus::Active => self.tier.limits(),
            BillingStatus::PastDue | BillingStatus::Cancelled => PlanLimits::FREE_TIER,
        }
    }

    /// Advance to a new billing period, resetting both counters.
    pub fn roll_period(&mut self, period_start: Timestamp) {
        self.period_start = period_start;
        self.jobs_published = 0;
        self.applications_submitted = 0;
    }
}
