use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::PaymentSettlement;

pub fn billing_routes(settlement: Arc<PaymentSettlement>) -> Router {
    Router::new()
        .route("/invoices/{invoice_id}", get(handlers::get_invoice))
        .route("/invoices/{invoice_id}/settle/offline", post(handlers::settle_offline))
        .route("/invoices/{invoice_id}/settle/wallet", post(handlers::settle_wallet))
        .route("/invoices/{invoice_id}/online-order", post(handlers::create_online_order))
        .route("/gateway/callback", post(handlers::gateway_callback))
        .route("/wallets/{patient_id}", get(handlers::get_wallet).post(handlers::ensure_wallet))
        .with_state(settlement)
}

/// Mounted under `/appointments` next to the booking routes.
pub fn cancellation_routes(settlement: Arc<PaymentSettlement>) -> Router {
    Router::new()
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .with_state(settlement)
}
