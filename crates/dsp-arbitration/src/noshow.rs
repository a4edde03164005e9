//! # No-Show Report & Confirmation Flow
//!
//! A company reports a no-show on an accepted booking; an administrator
//! (or the driver, admitting fault) confirms or dismisses it.
//! Confirmation cancels the booking, mirrors the job, and applies
//! exactly one sanction to the driver.
//!
//! Single invocation of the sanction engine is guaranteed by the
//! booking's resolution marker: a second confirmation attempt fails with
//! a conflict before any mutation happens.

use dsp_core::{Actor, Timestamp};
use dsp_lifecycle::{Booking, DriverProfile, Job};

use crate::error::ArbitrationError;
use crate::sanction::{Sanction, SanctionEngine};

/// File a no-show report on an accepted booking.
///
/// Thin wrapper over the booking marker so all incident flows enter
/// through this crate.
pub fn report_no_show(
    booking: &mut Booking,
    job: &Job,
    actor: &Actor,
    reason: impl Into<String>,
) -> Result<(), ArbitrationError> {
    booking.report_no_show(actor, job, reason)?;
    tracing::info!(booking = %booking.id, job = %job.id, "no-show reported");
    Ok(())
}

/// Resolve a reported no-show.
///
/// On confirmation: the booking cancels, the job mirrors the
/// cancellation, and the driver receives one strike through the sanction
/// engine. Returns the applied sanction, or `None` if the report was
/// dismissed.
///
/// Must run inside the store's atomic updates for all three entities.
pub fn confirm_no_show(
    booking: &mut Booking,
    job: &mut Job,
    driver: &mut DriverProfile,
    actor: &Actor,
    confirmed: bool,
    comment: Option<String>,
) -> Result<Option<Sanction>, ArbitrationError> {
    let was_confirmed = booking.resolve_no_show(actor, confirmed, comment)?;
    if !was_confirmed {
        tracing::info!(booking = %booking.id, "no-show report dismissed");
        return Ok(None);
    }

    job.mirror_booking(booking.status);
    let sanction = SanctionEngine.apply_strike(driver, Timestamp::now());
    Ok(Some(sanction))
}
