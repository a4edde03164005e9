//! # Sanction Engine
//!
//! Computes and applies the escalating penalty for a confirmed driver
//! no-show. The ladder is a total, deterministic function of the strike
//! count *after* increment:
//!
//! | Strikes | Sanction                                   |
//! |---------|--------------------------------------------|
//! | 1       | Warning — no availability change           |
//! | 2       | 7-day suspension — driver unavailable      |
//! | ≥3      | Permanent ban — no expiry                  |
//!
//! The engine performs no idempotency checks of its own. The caller
//! guarantees single invocation per incident by resolving the booking's
//! no-show marker first (a second resolution is a conflict before this
//! code runs).

use serde::{Deserialize, Serialize};

use dsp_core::Timestamp;
use dsp_lifecycle::DriverProfile;

/// Length of the suspension window applied at the second strike.
pub const SUSPENSION_DAYS: i64 = 7;

/// The sanction applied for a confirmed no-show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sanction {
    /// First strike: warning only.
    Warning,
    /// Second strike: temporary suspension.
    Suspension {
        /// End of the suspension window.
        until: Timestamp,
    },
    /// Third strike and beyond: permanent ban.
    PermanentBan,
}

impl std::fmt::Display for Sanction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => f.write_str("WARNING"),
            Self::Suspension { until } => write!(f, "SUSPENSION_UNTIL_{until}"),
            Self::PermanentBan => f.write_str("PERMANENT_BAN"),
        }
    }
}

/// The sanction engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SanctionEngine;

impl SanctionEngine {
    /// Apply exactly one strike to the driver and the resulting sanction.
    ///
    /// Must run inside the store's atomic driver update.
    pub fn apply_strike(&self, profile: &mut DriverProfile, now: Timestamp) -> Sanction {
        let count = profile.add_strike();
        let sanction = match count {
            1 => Sanction::Warning,
            2 => Sanction::Suspension {
                until: now.plus_days(SUSPENSION_DAYS),
            },
            _ => Sanction::PermanentBan,
        };
        match sanction {
            Sanction::Warning => {}
            Sanction::Suspension { until } => profile.suspend_until(until),
            Sanction::PermanentBan => profile.ban(),
        }
        tracing::info!(
            driver = %profile.id,
            strikes = count,
            sanction = %sanction,
            "sanction applied for confirmed no-show"
        );
        sanction
    }
}
