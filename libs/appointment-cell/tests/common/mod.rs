#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::mpsc::Receiver;

use appointment_cell::{BookAppointmentRequest, BookingAdmissionController, PrescriptionService};
use billing_cell::{PaymentSettlement, RazorpayGateway};
use notification_cell::{Notification, NotificationQueue};
use shared_models::{Doctor, Patient};
use shared_utils::test_utils::TestClinic;

/// Booking, settlement and prescriptions wired to one in-memory clinic.
pub struct Desk {
    pub clinic: TestClinic,
    pub booking: Arc<BookingAdmissionController>,
    pub settlement: Arc<PaymentSettlement>,
    pub prescriptions: Arc<PrescriptionService>,
    pub outbox: Receiver<Notification>,
}

pub fn desk() -> Desk {
    desk_for(TestClinic::default())
}

pub fn desk_for(clinic: TestClinic) -> Desk {
    let (queue, outbox) = NotificationQueue::new(256);
    desk_with_queue(clinic, queue, outbox)
}

pub fn desk_with_queue(
    clinic: TestClinic,
    queue: NotificationQueue,
    outbox: Receiver<Notification>,
) -> Desk {
    let booking = BookingAdmissionController::new(
        &clinic.config,
        clinic.store.clone(),
        clinic.clock.clone(),
        queue.clone(),
    );
    let settlement = PaymentSettlement::new(
        &clinic.config,
        clinic.store.clone(),
        clinic.clock.clone(),
        Arc::new(RazorpayGateway::new(&clinic.config)),
        queue,
    );
    let prescriptions = PrescriptionService::new(clinic.store.clone(), clinic.clock.clone());
    Desk {
        clinic,
        booking: Arc::new(booking),
        settlement: Arc::new(settlement),
        prescriptions: Arc::new(prescriptions),
        outbox,
    }
}

/// An approved doctor open 09:00-10:00 tomorrow.
pub async fn open_doctor(clinic: &TestClinic, charge: Decimal) -> (Doctor, NaiveDate) {
    let doctor = clinic.add_doctor(charge).await;
    let date = clinic.tomorrow();
    clinic.add_availability(doctor.id, date, "09:00-10:00").await;
    (doctor, date)
}

pub fn booking_request(
    patient: &Patient,
    doctor: &Doctor,
    date: NaiveDate,
    time_slot: &str,
) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id: patient.id,
        doctor_id: doctor.id,
        date,
        time_slot: time_slot.to_string(),
        health_issue: "Persistent cough".to_string(),
        email: patient.email.clone(),
    }
}
