use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::AvailabilityService;

pub fn availability_routes(service: Arc<AvailabilityService>) -> Router {
    Router::new()
        .route("/doctors/{doctor_id}", post(handlers::create_availability))
        .route("/doctors/{doctor_id}/slots", get(handlers::get_available_slots))
        .with_state(service)
}
