use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{AvailableSlotsQuery, CreateAvailabilityRequest};
use crate::services::AvailabilityService;

#[axum::debug_handler]
pub async fn get_available_slots(
    State(service): State<Arc<AvailabilityService>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let response = service.available_slots(doctor_id, query.date).await?;

    Ok(Json(json!({
        "doctor_id": response.doctor_id,
        "date": response.date,
        "available_time": response.available_time,
        "available_slots": response.slots,
        "total": response.slots.len()
    })))
}

#[axum::debug_handler]
pub async fn create_availability(
    State(service): State<Arc<AvailabilityService>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let window = service.create_availability(doctor_id, request).await?;

    Ok(Json(json!({
        "availability": window,
        "available_time": window.available_time(),
        "message": "Availability created"
    })))
}
