use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use chrono::NaiveDate;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::services::availability::AvailabilityService;
use crate::models::{
    AvailableSlotsResponse, CreateWindowRequest, UpdateWindowRequest,
    SetUnavailableRequest, SchedulingError,
};

/// Slot length used when the caller does not request one.
const DEFAULT_SLOT_MINUTES: i32 = 30;

// Query parameters for different endpoints
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

fn map_scheduling_error(err: SchedulingError) -> AppError {
    match err {
        SchedulingError::InvalidInterval { .. } => AppError::ValidationError(err.to_string()),
        SchedulingError::InvalidDuration(_) => AppError::ValidationError(err.to_string()),
        SchedulingError::WindowNotFound => AppError::NotFound(err.to_string()),
        SchedulingError::DuplicateWindow(_) => AppError::Conflict(err.to_string()),
        SchedulingError::WindowHasBookings => AppError::Conflict(err.to_string()),
        SchedulingError::WindowLocked => AppError::Conflict(err.to_string()),
        SchedulingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// SLOT QUERY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(staff_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<AvailableSlotsResponse>, AppError> {
    let service = AvailabilityService::new(&state);

    let duration = query.duration_minutes.unwrap_or(DEFAULT_SLOT_MINUTES);
    let slots = service.available_slots(staff_id, query.date, duration)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(AvailableSlotsResponse {
        staff_id,
        date: query.date,
        slots,
    }))
}

#[axum::debug_handler]
pub async fn get_window_stats(
    State(state): State<Arc<AppConfig>>,
    Path(staff_id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);

    let stats = service.window_stats(staff_id, query.date)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!(stats)))
}

// ==============================================================================
// AVAILABILITY WINDOW HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_window(
    State(state): State<Arc<AppConfig>>,
    Path(staff_id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);

    let window = service.get_window(staff_id, query.date)
        .await
        .map_err(map_scheduling_error)?
        .ok_or_else(|| AppError::NotFound(
            format!("No availability window published for {}", query.date)
        ))?;

    Ok(Json(json!(window)))
}

#[axum::debug_handler]
pub async fn create_window(
    State(state): State<Arc<AppConfig>>,
    Path(staff_id): Path<Uuid>,
    Json(request): Json<CreateWindowRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);

    let window = service.create_window(staff_id, request)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "message": "Availability window created",
        "window": window
    })))
}

#[axum::debug_handler]
pub async fn update_window(
    State(state): State<Arc<AppConfig>>,
    Path((staff_id, window_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateWindowRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);

    let window = service.update_window(staff_id, window_id, request, chrono::Utc::now())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "message": "Availability window updated",
        "window": window
    })))
}

#[axum::debug_handler]
pub async fn set_unavailable(
    State(state): State<Arc<AppConfig>>,
    Path((staff_id, window_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SetUnavailableRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);

    let window = service.set_unavailable(staff_id, window_id, request.reason)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "message": "Availability window marked unavailable",
        "window": window
    })))
}

#[axum::debug_handler]
pub async fn set_available(
    State(state): State<Arc<AppConfig>>,
    Path((staff_id, window_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);

    let window = service.set_available(staff_id, window_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "message": "Availability window marked available",
        "window": window
    })))
}

#[axum::debug_handler]
pub async fn delete_window(
    State(state): State<Arc<AppConfig>>,
    Path((staff_id, window_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);

    service.delete_window(staff_id, window_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "message": "Availability window deleted"
    })))
}
