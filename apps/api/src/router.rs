use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use appointment_cell::{BookingAdmissionController, PrescriptionService};
use availability_cell::router::availability_routes;
use availability_cell::AvailabilityService;
use billing_cell::router::{billing_routes, cancellation_routes};
use billing_cell::{PaymentGateway, PaymentSettlement};
use notification_cell::NotificationQueue;
use shared_config::AppConfig;
use shared_database::Store;
use shared_utils::Clock;

/// Every cell service, sharing one store, clock and notification queue.
pub struct ClinicServices {
    pub availability: Arc<AvailabilityService>,
    pub booking: Arc<BookingAdmissionController>,
    pub prescriptions: Arc<PrescriptionService>,
    pub settlement: Arc<PaymentSettlement>,
}

impl ClinicServices {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: NotificationQueue,
    ) -> Self {
        Self {
            availability: Arc::new(AvailabilityService::new(config, store.clone(), clock.clone())),
            booking: Arc::new(BookingAdmissionController::new(
                config,
                store.clone(),
                clock.clone(),
                notifier.clone(),
            )),
            prescriptions: Arc::new(PrescriptionService::new(store.clone(), clock.clone())),
            settlement: Arc::new(PaymentSettlement::new(config, store, clock, gateway, notifier)),
        }
    }
}

pub fn create_router(services: &ClinicServices) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/availability", availability_routes(services.availability.clone()))
        .nest(
            "/appointments",
            appointment_routes(services.booking.clone(), services.prescriptions.clone())
                .merge(cancellation_routes(services.settlement.clone())),
        )
        .nest("/billing", billing_routes(services.settlement.clone()))
}
