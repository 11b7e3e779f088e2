use chrono::{NaiveDate, DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    AppointmentRecord, AvailabilityWindow, BookedInterval, Slot, SchedulingError,
    CreateWindowRequest, UpdateWindowRequest, TimeInterval, WindowStats,
};
use crate::services::slots;

/// Store-backed orchestration around the pure slot engine. Reads windows
/// and appointments from the external store, runs the in-memory
/// computations, and persists window mutations.
pub struct AvailabilityService {
    supabase: SupabaseClient,
    /// Shortest bookable duration, from clinic configuration. Never below
    /// the engine's own floor.
    min_slot_minutes: i32,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            min_slot_minutes: config.min_slot_minutes.max(slots::MIN_SLOT_MINUTES),
        }
    }

    /// Fetch the availability window for a staff member on a date, if one
    /// has been published.
    pub async fn get_window(
        &self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityWindow>, SchedulingError> {
        debug!("Fetching availability window for staff {} on {}", staff_id, date);

        let path = format!(
            "/rest/v1/staff_availability?staff_id=eq.{}&date=eq.{}",
            staff_id, date
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => {
                let window: AvailabilityWindow = serde_json::from_value(row)
                    .map_err(|e| SchedulingError::DatabaseError(format!("Failed to parse window: {}", e)))?;
                Ok(Some(window))
            }
            None => Ok(None),
        }
    }

    /// All appointment intervals for a staff member on a date, regardless
    /// of status. Occupancy filtering happens in the caller via
    /// `BookedInterval::occupies_slot`.
    pub async fn get_booked_intervals(
        &self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<BookedInterval>, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?staff_id=eq.{}&date=eq.{}&order=start_time.asc",
            staff_id, date
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;

        let appointments: Vec<AppointmentRecord> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<AppointmentRecord>, _>>()
            .map_err(|e| SchedulingError::DatabaseError(format!("Failed to parse appointments: {}", e)))?;

        Ok(appointments.iter().map(|a| a.booked_interval()).collect())
    }

    /// Compute the free slots of the requested duration for a staff member
    /// on a date. No published window, or a window toggled unavailable, is
    /// a valid "no availability" outcome and yields an empty list.
    pub async fn available_slots(
        &self,
        staff_id: Uuid,
        date: NaiveDate,
        duration_minutes: i32,
    ) -> Result<Vec<Slot>, SchedulingError> {
        debug!("Calculating available slots for staff {} on {}", staff_id, date);

        // Clinic-configured minimum, checked before any store round trip
        if duration_minutes < self.min_slot_minutes {
            return Err(SchedulingError::InvalidDuration(duration_minutes));
        }

        let window = match self.get_window(staff_id, date).await? {
            Some(window) => window,
            None => {
                debug!("No availability window published for staff {} on {}", staff_id, date);
                return Ok(vec![]);
            }
        };

        let occupied = self.occupied_intervals(staff_id, date).await?;
        slots::free_slots(&window, &occupied, duration_minutes)
    }

    /// Advisory conflict check for a candidate booking. The authoritative
    /// check must run again inside the store's transaction at commit time.
    pub async fn check_booking_conflict(
        &self,
        staff_id: Uuid,
        date: NaiveDate,
        candidate: &TimeInterval,
    ) -> Result<bool, SchedulingError> {
        let occupied = self.occupied_intervals(staff_id, date).await?;
        let conflict = slots::has_conflict(candidate, &occupied);

        if conflict {
            warn!(
                "Conflict detected for staff {} on {} at {}",
                staff_id, date, candidate
            );
        }

        Ok(conflict)
    }

    /// Publish a new availability window. One window per staff+date; a
    /// second is rejected, not merged.
    pub async fn create_window(
        &self,
        staff_id: Uuid,
        request: CreateWindowRequest,
    ) -> Result<AvailabilityWindow, SchedulingError> {
        debug!("Creating availability window for staff {} on {}", staff_id, request.date);

        // Validate the time range before touching the store
        TimeInterval::new(request.start_time, request.end_time)?;

        if self.get_window(staff_id, request.date).await?.is_some() {
            return Err(SchedulingError::DuplicateWindow(request.date));
        }

        let window_data = json!({
            "staff_id": staff_id,
            "date": request.date,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "is_available": true,
            "notes": request.notes,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/staff_availability",
            Some(window_data),
            Some(headers),
        ).await.map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;

        let row = result.into_iter().next()
            .ok_or_else(|| SchedulingError::DatabaseError("Failed to create availability window".to_string()))?;

        let window: AvailabilityWindow = serde_json::from_value(row)
            .map_err(|e| SchedulingError::DatabaseError(format!("Failed to parse window: {}", e)))?;
        debug!("Availability window created with ID: {}", window.id);

        Ok(window)
    }

    /// Edit a window that has not started yet. Past or already-started
    /// windows are read-only.
    pub async fn update_window(
        &self,
        staff_id: Uuid,
        window_id: Uuid,
        request: UpdateWindowRequest,
        now: DateTime<Utc>,
    ) -> Result<AvailabilityWindow, SchedulingError> {
        debug!("Updating availability window: {}", window_id);

        let current = self.get_window_by_id(staff_id, window_id).await?;

        if !current.can_be_modified(now) {
            return Err(SchedulingError::WindowLocked);
        }

        let start_time = request.start_time.unwrap_or(current.start_time);
        let end_time = request.end_time.unwrap_or(current.end_time);
        TimeInterval::new(start_time, end_time)?;

        let mut update_data = serde_json::Map::new();
        update_data.insert("start_time".to_string(), json!(start_time.format("%H:%M:%S").to_string()));
        update_data.insert("end_time".to_string(), json!(end_time.format("%H:%M:%S").to_string()));
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        self.patch_window(staff_id, window_id, Value::Object(update_data)).await
    }

    /// Toggle a window off, appending the reason to its notes. The
    /// transition itself is unconditional; callers gate future-only edits
    /// through `can_be_modified`.
    pub async fn set_unavailable(
        &self,
        staff_id: Uuid,
        window_id: Uuid,
        reason: Option<String>,
    ) -> Result<AvailabilityWindow, SchedulingError> {
        debug!("Marking window {} unavailable", window_id);

        let mut current = self.get_window_by_id(staff_id, window_id).await?;
        current.make_unavailable(reason.as_deref());

        let update_data = json!({
            "is_available": false,
            "notes": current.notes,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_window(staff_id, window_id, update_data).await
    }

    /// Toggle a window back on. Clears nothing beyond the flag.
    pub async fn set_available(
        &self,
        staff_id: Uuid,
        window_id: Uuid,
    ) -> Result<AvailabilityWindow, SchedulingError> {
        debug!("Marking window {} available", window_id);

        // Confirm the window exists before patching
        self.get_window_by_id(staff_id, window_id).await?;

        let update_data = json!({
            "is_available": true,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_window(staff_id, window_id, update_data).await
    }

    /// Delete a window that has no booked, non-cancelled appointments.
    pub async fn delete_window(
        &self,
        staff_id: Uuid,
        window_id: Uuid,
    ) -> Result<(), SchedulingError> {
        debug!("Deleting availability window: {}", window_id);

        let window = self.get_window_by_id(staff_id, window_id).await?;

        let booked = self.get_booked_intervals(staff_id, window.date).await?;
        if booked.iter().any(|b| b.occupies_slot()) {
            return Err(SchedulingError::WindowHasBookings);
        }

        let path = format!(
            "/rest/v1/staff_availability?id=eq.{}&staff_id=eq.{}",
            window_id, staff_id
        );
        let _: Vec<Value> = self.supabase.request(Method::DELETE, &path, None)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Per-day occupancy summary: booked count and utilization percentage.
    pub async fn window_stats(
        &self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<WindowStats, SchedulingError> {
        let window = self.get_window(staff_id, date).await?
            .ok_or(SchedulingError::WindowNotFound)?;

        let booked = self.get_booked_intervals(staff_id, date).await?;

        Ok(WindowStats {
            staff_id,
            date,
            window_minutes: window.duration_minutes(),
            booked_count: slots::booked_count(&booked),
            utilization_percentage: slots::utilization_percentage(&window, &booked),
        })
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn occupied_intervals(
        &self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<TimeInterval>, SchedulingError> {
        let booked = self.get_booked_intervals(staff_id, date).await?;

        // A row the store hands back with a non-positive or wrapping
        // duration is store corruption, not caller error
        booked.iter()
            .filter(|b| b.occupies_slot())
            .map(|b| {
                b.interval().map_err(|e| SchedulingError::DatabaseError(
                    format!("Stored appointment has invalid interval: {}", e)
                ))
            })
            .collect()
    }

    async fn get_window_by_id(
        &self,
        staff_id: Uuid,
        window_id: Uuid,
    ) -> Result<AvailabilityWindow, SchedulingError> {
        let path = format!(
            "/rest/v1/staff_availability?id=eq.{}&staff_id=eq.{}",
            window_id, staff_id
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;

        let row = result.into_iter().next().ok_or(SchedulingError::WindowNotFound)?;

        serde_json::from_value(row)
            .map_err(|e| SchedulingError::DatabaseError(format!("Failed to parse window: {}", e)))
    }

    async fn patch_window(
        &self,
        staff_id: Uuid,
        window_id: Uuid,
        update_data: Value,
    ) -> Result<AvailabilityWindow, SchedulingError> {
        let path = format!(
            "/rest/v1/staff_availability?id=eq.{}&staff_id=eq.{}",
            window_id, staff_id
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(update_data),
            Some(headers),
        ).await.map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;

        let row = result.into_iter().next().ok_or(SchedulingError::WindowNotFound)?;

        serde_json::from_value(row)
            .map_err(|e| SchedulingError::DatabaseError(format!("Failed to parse window: {}", e)))
    }
}
