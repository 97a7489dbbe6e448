use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::{BookingAdmissionController, PrescriptionService};

pub fn appointment_routes(
    controller: Arc<BookingAdmissionController>,
    prescriptions: Arc<PrescriptionService>,
) -> Router {
    let booking_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .with_state(controller);

    let prescription_routes = Router::new()
        .route("/{appointment_id}/prescription", post(handlers::add_prescription))
        .with_state(prescriptions);

    Router::new()
        .merge(booking_routes)
        .merge(prescription_routes)
}
