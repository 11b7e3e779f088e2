use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put, patch, delete},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn scheduling_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        // Slot queries (consumed by the booking UI)
        .route("/staff/{staff_id}/slots", get(handlers::get_available_slots))
        .route("/staff/{staff_id}/stats", get(handlers::get_window_stats))

        // Availability window management
        .route("/staff/{staff_id}/availability", get(handlers::get_window))
        .route("/staff/{staff_id}/availability", post(handlers::create_window))
        .route("/staff/{staff_id}/availability/{window_id}", put(handlers::update_window))
        .route("/staff/{staff_id}/availability/{window_id}", delete(handlers::delete_window))
        .route("/staff/{staff_id}/availability/{window_id}/unavailable", patch(handlers::set_unavailable))
        .route("/staff/{staff_id}/availability/{window_id}/available", patch(handlers::set_available))

        .with_state(state)
}
