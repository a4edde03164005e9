//! # The Usage Gate
//!
//! Pure decision logic: given a subscription (or none, meaning the
//! implicit free tier) and an action, decide whether the action is
//! allowed and report the remaining quota. Persistence of the
//! incremented counter is the caller's concern — the engine increments
//! inside the same store update that commits the created entity.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::{PlanLimits, Subscription};

/// The action a user is about to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageAction {
    /// A company publishes a job.
    PublishJob,
    /// A driver submits an application.
    SubmitApplication,
}

impl UsageAction {
    /// The canonical string name of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublishJob => "publish_job",
            Self::SubmitApplication => "submit_application",
        }
    }
}

impl std::fmt::Display for UsageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A granted quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaDecision {
    /// The action that was checked.
    pub action: UsageAction,
    /// Remaining quota after this action, `None` = unlimited.
    pub remaining: Option<u32>,
}

/// Denial raised by the usage gate.
#[derive(Error, Debug)]
pub enum QuotaError {
    /// The plan's monthly limit for this action is exhausted.
    #[error(
        "monthly limit reached for {action}: {used}/{limit} used this billing period; upgrade your plan to continue"
    )]
    LimitReached {
        /// The denied action.
        action: UsageAction,
        /// The plan's limit for the action.
        limit: u32,
        /// Usage recorded this billing period.
        used: u32,
    },
}

/// The usage gate. Stateless — all state lives in the subscription row.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageGate;

impl UsageGate {
    /// Check whether `action` is allowed under the user's current plan.
    ///
    /// `subscription` is `None` for users without a stored subscription;
    /// they are treated as being on the implicit free tier with zero
    /// recorded usage tracked on a synthetic row by the caller.
    pub fn check(
        &self,
        subscription: Option<&Subscription>,
        action: UsageAction,
    ) -> Result<QuotaDecision, QuotaError> {
        let (limits, used) = match subscription {
            Some(sub) => (sub.effective_limits(), used_count(sub, action)),
            None => (PlanLimits::FREE_TIER, 0),
        };

        let limit = match action {
            UsageAction::PublishJob => limits.max_jobs_per_month,
            UsageAction::SubmitApplication => limits.max_applications_per_month,
        };

        match limit {
            None => Ok(QuotaDecision {
                action,
                remaining: None,
            }),
            Some(limit) if used < limit => Ok(QuotaDecision {
                action,
                remaining: Some(limit - used - 1),
            }),
            Some(limit) => Err(QuotaError::LimitReached {
                action,
                limit,
                used,
            }),
        }
    }

    /// Record a granted action on the subscription's counters.
    ///
    /// Called only after the corresponding entity was created, inside
    /// the same store update.
    pub fn record(&self, subscription: &mut Subscription, action: UsageAction) {
        match action {
            UsageAction::PublishJob => subscription.jobs_published += 1,
            UsageAction::SubmitApplication => subscription.applications_submitted += 1,
        }
    }
}

fn used_count(sub: &Subscription, action: UsageAction) -> u32 {
    match action {
        UsageAction::PublishJob => sub.jobs_published,
        UsageAction::SubmitApplication => sub.applications_submitted,
    }
}
