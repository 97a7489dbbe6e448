use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use availability_cell::SlotAllocator;
use billing_cell::InvoiceService;
use notification_cell::{due_invoice_notification, InvoiceDocument, NotificationQueue};
use shared_config::AppConfig;
use shared_database::{
    AppointmentFilter, AppointmentRepository, AvailabilityRepository, DoctorRepository,
    InvoiceRepository, PatientRepository, PrescriptionRepository, Store,
};
use shared_models::{Appointment, BookingStatus, PaymentStatus};
use shared_utils::Clock;

use crate::models::{AppointmentDetails, BookAppointmentRequest, BookingConfirmation, BookingError};

/// Admission control for new bookings.
///
/// Every check and both inserts run inside one store transaction, so two
/// requests for the same slot are decided one after the other. A pending
/// booking does not hold its slot; only confirmed and completed ones do.
pub struct BookingAdmissionController {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    allocator: SlotAllocator,
    invoices: InvoiceService,
    notifier: NotificationQueue,
}

impl BookingAdmissionController {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        notifier: NotificationQueue,
    ) -> Self {
        Self {
            store,
            clock,
            allocator: SlotAllocator::from_config(config),
            invoices: InvoiceService::new(config),
            notifier,
        }
    }

    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id, date = %request.date, slot = %request.time_slot))]
    pub async fn request_booking(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<BookingConfirmation, BookingError> {
        validate_request(&request)?;

        let now = self.clock.now();
        if request.date < self.clock.today() {
            warn!("Rejected past-dated booking for {}", request.date);
            return Err(BookingError::PastDate(request.date));
        }
        if SlotAllocator::has_started(&request.time_slot, request.date, now) {
            warn!("Rejected booking for started slot {} on {}", request.time_slot, request.date);
            return Err(BookingError::SlotStarted(request.time_slot));
        }

        let mut tx = self.store.begin().await?;

        let window = tx
            .find_availability(request.doctor_id, request.date)
            .await?
            .ok_or(BookingError::AvailabilityNotFound(request.date))?;

        if !self.allocator.contains(&window, &request.time_slot) {
            return Err(BookingError::InvalidSlot(request.time_slot));
        }

        let holders = tx
            .find_appointments(
                &AppointmentFilter::for_slot(request.doctor_id, request.date, &request.time_slot)
                    .with_statuses(&[BookingStatus::Confirmed, BookingStatus::Completed]),
            )
            .await?;
        if !holders.is_empty() {
            warn!("Slot {} already held by appointment {}", request.time_slot, holders[0].id);
            return Err(BookingError::SlotTaken);
        }

        let existing = tx
            .find_appointments(
                &AppointmentFilter::for_day(request.doctor_id, request.date)
                    .with_patient(request.patient_id)
                    .with_statuses(&BookingStatus::active()),
            )
            .await?;
        if !existing.is_empty() {
            return Err(BookingError::DuplicateBooking);
        }

        if tx.find_patient(request.patient_id).await?.is_none() {
            return Err(BookingError::PatientNotFound);
        }
        let doctor = tx
            .find_doctor(request.doctor_id)
            .await?
            .ok_or(BookingError::DoctorNotFound)?;

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            patient_email: request.email,
            date: request.date,
            time_slot: request.time_slot,
            health_issue: request.health_issue,
            booking_status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        tx.insert_appointment(appointment.clone()).await?;
        let invoice = self
            .invoices
            .open_invoice(tx.as_mut(), &appointment, doctor.consultancy_charge, now)
            .await?;
        tx.commit().await?;

        info!(
            "Booked appointment {} ({}), invoice {} for {}",
            appointment.id, appointment.time_slot, invoice.id, invoice.total_amount
        );

        let document = InvoiceDocument::new(&invoice, &appointment).with_doctor(&doctor);
        let notification = self
            .notifier
            .dispatch(due_invoice_notification(&document, now));

        Ok(BookingConfirmation {
            appointment,
            invoice,
            notification,
        })
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<AppointmentDetails, BookingError> {
        let mut tx = self.store.begin().await?;
        let appointment = tx
            .find_appointment(appointment_id)
            .await?
            .ok_or(BookingError::AppointmentNotFound)?;
        let invoice = tx.find_invoice_by_appointment(appointment_id).await?;
        let prescription = tx.find_prescription_by_appointment(appointment_id).await?;
        tx.rollback().await?;

        debug!("Loaded appointment {} ({})", appointment.id, appointment.booking_status);
        Ok(AppointmentDetails {
            appointment,
            invoice,
            prescription,
        })
    }
}

fn validate_request(request: &BookAppointmentRequest) -> Result<(), BookingError> {
    if request.health_issue.trim().is_empty() {
        return Err(BookingError::ValidationError(
            "health_issue must not be empty".to_string(),
        ));
    }
    if !request.email.contains('@') {
        return Err(BookingError::ValidationError(format!(
            "invalid email address: '{}'",
            request.email
        )));
    }
    Ok(())
}
