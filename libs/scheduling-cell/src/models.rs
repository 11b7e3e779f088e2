// libs/scheduling-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate, NaiveTime, Duration};
use std::fmt;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

/// Half-open time-of-day span `[start, end)` at minute granularity.
///
/// Construction enforces `end > start`; back-to-back intervals sharing a
/// boundary minute do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeInterval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, SchedulingError> {
        if end <= start {
            return Err(SchedulingError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// One staff member's bookable span on one calendar day. Exactly one window
/// is expected per (staff_id, date) pair; the store rejects duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityWindow {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    pub fn interval(&self) -> Result<TimeInterval, SchedulingError> {
        TimeInterval::new(self.start_time, self.end_time)
    }

    /// Whether new bookings may target this window: the flag is on and the
    /// window has not started yet relative to the injected clock.
    pub fn is_bookable(&self, now: DateTime<Utc>) -> bool {
        self.is_available && self.has_not_started(now)
    }

    /// Edits and deletes are allowed only while the window is still in the
    /// future. Independent of `is_available`: an unavailable-but-future
    /// window can still be edited back to available.
    pub fn can_be_modified(&self, now: DateTime<Utc>) -> bool {
        self.has_not_started(now)
    }

    fn has_not_started(&self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        self.date > today || (self.date == today && now.time() < self.start_time)
    }

    /// Unconditional transition; callers gate on `can_be_modified` first.
    pub fn make_unavailable(&mut self, reason: Option<&str>) {
        self.is_available = false;
        if let Some(reason) = reason {
            self.notes = Some(match self.notes.take() {
                Some(existing) => format!("{} | {}", existing, reason),
                None => reason.to_string(),
            });
        }
    }

    pub fn make_available(&mut self) {
        self.is_available = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Whether an appointment in this status occupies its time slot for
    /// conflict and utilization purposes.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// Projection of an appointment row onto the slot engine's input shape.
/// Derived, never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedInterval {
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
}

impl BookedInterval {
    pub fn end_time(&self) -> NaiveTime {
        self.start_time + Duration::minutes(self.duration_minutes as i64)
    }

    pub fn interval(&self) -> Result<TimeInterval, SchedulingError> {
        TimeInterval::new(self.start_time, self.end_time())
    }

    pub fn occupies_slot(&self) -> bool {
        self.status.occupies_slot()
    }
}

/// A bookable candidate computed on demand. Never cached across requests:
/// stale slots would invite double-booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub label: String,
}

impl Slot {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            start_time,
            end_time,
            label: format!("{} - {}", start_time.format("%H:%M"), end_time.format("%H:%M")),
        }
    }
}

/// Appointment row as stored, pre-filtered by the store to one staff+date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
}

impl AppointmentRecord {
    pub fn booked_interval(&self) -> BookedInterval {
        BookedInterval {
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
            status: self.status,
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWindowRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWindowRequest {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetUnavailableRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    pub staff_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

/// Per-day occupancy summary for a staff member's window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowStats {
    pub staff_id: Uuid,
    pub date: NaiveDate,
    pub window_minutes: i64,
    pub booked_count: usize,
    pub utilization_percentage: f64,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid interval: end {end} must be after start {start}")]
    InvalidInterval { start: NaiveTime, end: NaiveTime },

    #[error("Invalid slot duration: {0} minutes")]
    InvalidDuration(i32),

    #[error("Availability window not found")]
    WindowNotFound,

    #[error("An availability window already exists for this staff member on {0}")]
    DuplicateWindow(NaiveDate),

    #[error("Availability window has booked appointments")]
    WindowHasBookings,

    #[error("Availability window has already started and can no longer be modified")]
    WindowLocked,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
