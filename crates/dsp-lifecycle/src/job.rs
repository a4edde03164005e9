//! # Job — Published Delivery Work
//!
//! A job's status is a write-through projection of its accepted
//! booking's progress. It is never computed lazily: the engine calls
//! [`Job::mirror_booking`] inside the same atomic store update as the
//! booking transition, so the two columns cannot drift.
//!
//! While no booking is accepted the job stays `Open`. Jobs are never
//! physically deleted — cancellation is a status.

use serde::{Deserialize, Serialize};

use dsp_core::{CompanyId, CoreError, JobId, Money, Timestamp};

use crate::booking::BookingStatus;

// ─── Job Status ──────────────────────────────────────────────────────

/// The status of a published job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Published, accepting applications.
    Open,
    /// A candidate has been accepted.
    Assigned,
    /// The accepted booking is underway.
    InProgress,
    /// The accepted booking reports delivery.
    Delivered,
    /// Completion validated. Terminal.
    Completed,
    /// Cancelled. Terminal.
    Cancelled,
}

impl JobStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Delivered => "DELIVERED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The job status mirroring a booking status.
    ///
    /// A `Pending` booking does not occupy the job, so it maps to `Open`.
    pub fn mirroring(booking: BookingStatus) -> JobStatus {
        match booking {
            BookingStatus::Pending => Self::Open,
            BookingStatus::Assigned => Self::Assigned,
            BookingStatus::InProgress => Self::InProgress,
            BookingStatus::Delivered => Self::Delivered,
            BookingStatus::Completed => Self::Completed,
            BookingStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Job ─────────────────────────────────────────────────────────────

/// A company-published unit of delivery work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// The publishing company.
    pub company_id: CompanyId,
    /// Current status (projection of the accepted booking).
    pub status: JobStatus,
    /// Short human-readable title.
    pub title: String,
    /// Day rate in minor currency units.
    pub day_rate: Money,
    /// Whether the job is flagged urgent.
    pub urgent: bool,
    /// Bonus added to the day rate for urgent jobs.
    pub urgency_bonus: Option<Money>,
    /// When the job was published (UTC).
    pub created_at: Timestamp,
    /// When the job last changed (UTC).
    pub updated_at: Timestamp,
}

impl Job {
    /// Publish a new job in the `Open` status.
    pub fn new(
        company_id: CompanyId,
        title: impl Into<String>,
        day_rate: Money,
        urgent: bool,
        urgency_bonus: Option<Money>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: JobId::new(),
            company_id,
            status: JobStatus::Open,
            title: title.into(),
            day_rate,
            urgent,
            urgency_bonus,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the job is open for applications.
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Open
    }

    /// Total price of the job: day rate plus urgency bonus when present.
    pub fn total_price(&self) -> Result<Money, CoreError> {
        match &self.urgency_bonus {
            Some(bonus) => self.day_rate.checked_add(bonus),
            None => Ok(self.day_rate.clone()),
        }
    }

    /// Mirror the accepted booking's progress onto this job.
    ///
    /// Must run inside the same atomic store update as the booking
    /// transition it reflects.
    pub fn mirror_booking(&mut self, booking: BookingStatus) {
        let next = JobStatus::mirroring(booking);
        if next != self.status {
            self.status = next;
            self.updated_at = Timestamp::now();
        }
    }
}
