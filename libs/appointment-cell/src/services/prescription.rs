use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use shared_database::{AppointmentRepository, PrescriptionRepository, Store};
use shared_models::{BookingStatus, Prescription};
use shared_utils::Clock;

use crate::models::{BookingError, CompletedVisit, PrescriptionRequest};
use crate::services::lifecycle::AppointmentLifecycleService;

/// Closes a confirmed visit by recording the doctor's prescription.
pub struct PrescriptionService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    lifecycle: AppointmentLifecycleService,
}

impl PrescriptionService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id))]
    pub async fn complete_with_prescription(
        &self,
        appointment_id: Uuid,
        request: PrescriptionRequest,
    ) -> Result<CompletedVisit, BookingError> {
        if request.prescription_text.trim().is_empty() {
            return Err(BookingError::ValidationError(
                "prescription_text must not be empty".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        // Someone else's appointment is reported as missing.
        let mut appointment = tx
            .find_appointment(appointment_id)
            .await?
            .filter(|a| a.doctor_id == request.doctor_id && a.patient_id == request.patient_id)
            .ok_or(BookingError::AppointmentNotFound)?;

        if let Some(blocker) = self.lifecycle.completion_blocker(appointment.booking_status) {
            return Err(blocker);
        }
        if tx.find_prescription_by_appointment(appointment_id).await?.is_some() {
            return Err(BookingError::PrescriptionExists);
        }
        self.lifecycle
            .validate_status_transition(appointment.booking_status, BookingStatus::Completed)?;

        let prescription = Prescription {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            appointment_id,
            health_issue: appointment.health_issue.clone(),
            prescription_text: request.prescription_text,
            created_at: now,
        };
        tx.insert_prescription(prescription.clone()).await?;

        appointment.booking_status = BookingStatus::Completed;
        appointment.updated_at = now;
        tx.update_appointment(appointment.clone()).await?;
        tx.commit().await?;

        info!("Appointment {} completed with prescription {}", appointment_id, prescription.id);
        Ok(CompletedVisit {
            appointment,
            prescription,
        })
    }
}
