//! Pure slot computation and conflict detection.
//!
//! Everything here is a synchronous function over data the caller already
//! fetched. The conflict pre-check is advisory only: the authoritative
//! check must run again inside the appointment store's transaction at
//! write time, since another request can book the same slot between the
//! read and the commit.

use chrono::Duration;
use tracing::debug;

use crate::models::{AvailabilityWindow, BookedInterval, Slot, SchedulingError, TimeInterval};

/// Shortest slot duration the engine will enumerate, in minutes.
pub const MIN_SLOT_MINUTES: i32 = 15;

/// Half-open overlap test: `[a.start, a.end)` and `[b.start, b.end)`
/// intersect iff `a.start < b.end && b.start < a.end`. Back-to-back
/// intervals sharing a boundary do not overlap, so appointments can be
/// scheduled end-to-end.
pub fn overlaps(a: &TimeInterval, b: &TimeInterval) -> bool {
    a.start() < b.end() && b.start() < a.end()
}

/// Whether a candidate interval collides with any booked interval.
/// Short-circuits on the first conflict.
pub fn has_conflict(candidate: &TimeInterval, booked: &[TimeInterval]) -> bool {
    booked.iter().any(|b| overlaps(candidate, b))
}

/// Enumerate the free slots of `duration_minutes` within a window.
///
/// Fixed-stride scan: the cursor starts at the window's start time and
/// advances by the requested duration, never re-probing at finer
/// granularity after a conflicting booking. A free gap that starts
/// off-stride (e.g. right after a booking ending at 09:40 when the stride
/// runs 09:00, 09:30, 10:00) is intentionally not offered; slots stay
/// aligned to the stride for predictable scheduling.
pub fn free_slots(
    window: &AvailabilityWindow,
    booked: &[TimeInterval],
    duration_minutes: i32,
) -> Result<Vec<Slot>, SchedulingError> {
    if duration_minutes < MIN_SLOT_MINUTES {
        return Err(SchedulingError::InvalidDuration(duration_minutes));
    }

    if !window.is_available {
        debug!("Window {} is marked unavailable, no slots offered", window.id);
        return Ok(vec![]);
    }

    let stride = Duration::minutes(duration_minutes as i64);
    let mut slots = Vec::new();
    let mut cursor = window.start_time;

    loop {
        // overflowing_add keeps a midnight wrap from looping forever
        let (candidate_end, wrapped) = cursor.overflowing_add_signed(stride);
        if wrapped != 0 || candidate_end > window.end_time {
            break;
        }

        let candidate = TimeInterval::new(cursor, candidate_end)?;
        if !has_conflict(&candidate, booked) {
            slots.push(Slot::new(cursor, candidate_end));
        }

        cursor = candidate_end;
    }

    debug!(
        "Found {} free {}-minute slots in window {}",
        slots.len(),
        duration_minutes,
        window.id
    );

    Ok(slots)
}

/// Count of appointments that occupy a slot (everything except cancelled
/// and no-show).
pub fn booked_count(appointments: &[BookedInterval]) -> usize {
    appointments.iter().filter(|a| a.occupies_slot()).count()
}

/// Occupied minutes over window minutes, as a percentage rounded to one
/// decimal place. Zero when the window has no positive duration.
pub fn utilization_percentage(
    window: &AvailabilityWindow,
    appointments: &[BookedInterval],
) -> f64 {
    let window_minutes = window.duration_minutes();
    if window_minutes <= 0 {
        return 0.0;
    }

    let occupied_minutes: i64 = appointments
        .iter()
        .filter(|a| a.occupies_slot())
        .map(|a| a.duration_minutes as i64)
        .sum();

    let percentage = 100.0 * occupied_minutes as f64 / window_minutes as f64;
    (percentage * 10.0).round() / 10.0
}
