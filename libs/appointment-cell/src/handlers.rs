use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{BookAppointmentRequest, PrescriptionRequest};
use crate::services::{BookingAdmissionController, PrescriptionService};

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(controller): State<Arc<BookingAdmissionController>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let confirmation = controller.request_booking(request).await?;

    Ok(Json(json!({
        "appointment": confirmation.appointment,
        "invoice": confirmation.invoice,
        "notification": confirmation.notification,
        "message": "Appointment booked, complete payment to confirm"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(controller): State<Arc<BookingAdmissionController>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let details = controller.get_appointment(appointment_id).await?;
    Ok(Json(json!(details)))
}

// ==============================================================================
// PRESCRIPTION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn add_prescription(
    State(prescriptions): State<Arc<PrescriptionService>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<PrescriptionRequest>,
) -> Result<Json<Value>, AppError> {
    let visit = prescriptions
        .complete_with_prescription(appointment_id, request)
        .await?;

    Ok(Json(json!({
        "appointment": visit.appointment,
        "prescription": visit.prescription,
        "message": "Prescription added"
    })))
}
