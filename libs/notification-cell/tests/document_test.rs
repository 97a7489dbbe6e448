use chrono::{Duration, NaiveDate};
use rust_decimal_macros::dec;
use uuid::Uuid;

use notification_cell::*;
use shared_models::{
    Appointment, BookingStatus, Doctor, Invoice, PaymentMethod, PaymentStatus,
};
use shared_utils::test_utils::test_now;

fn fixtures() -> (Invoice, Appointment, Doctor) {
    let doctor = Doctor {
        id: Uuid::new_v4(),
        name: "Dr. Meera Nair".to_string(),
        specialization: "General Medicine".to_string(),
        email: "meera@clinic.test".to_string(),
        consultancy_charge: dec!(500),
        approved: true,
    };
    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        doctor_id: doctor.id,
        patient_email: "arjun@clinic.test".to_string(),
        date: NaiveDate::from_ymd_opt(2030, 6, 11).unwrap(),
        time_slot: "09:00-09:30".to_string(),
        health_issue: "Fever".to_string(),
        booking_status: BookingStatus::Pending,
        payment_status: PaymentStatus::Pending,
        created_at: test_now(),
        updated_at: test_now(),
    };
    let invoice = Invoice {
        id: Uuid::new_v4(),
        doctor_id: doctor.id,
        patient_id: appointment.patient_id,
        appointment_id: appointment.id,
        total_amount: dec!(550),
        payment_method: PaymentMethod::Pending,
        payment_status: PaymentStatus::Pending,
        due_date: test_now() + Duration::days(1),
        created_at: test_now(),
        updated_at: test_now(),
    };
    (invoice, appointment, doctor)
}

#[test]
fn due_document_shows_balance_and_due_date() {
    let (invoice, appointment, doctor) = fixtures();
    let text = InvoiceDocument::new(&invoice, &appointment)
        .with_doctor(&doctor)
        .render_due();

    assert!(text.starts_with("Appointment Due Invoice"));
    assert!(text.contains("Doctor Name:      Dr. Meera Nair"));
    assert!(text.contains("Time Slot:        09:00-09:30"));
    assert!(text.contains("Due date:         2030-06-11"));
    assert!(text.contains("Balance due:      550.00"));
}

#[test]
fn paid_document_shows_method_and_zero_balance() {
    let (mut invoice, mut appointment, _) = fixtures();
    invoice.payment_method = PaymentMethod::Online;
    invoice.payment_status = PaymentStatus::Paid;
    appointment.booking_status = BookingStatus::Confirmed;

    let text = InvoiceDocument::new(&invoice, &appointment).render_paid();
    assert!(text.contains("Payment Method:   online"));
    assert!(text.contains("Booking Status:   confirmed"));
    assert!(text.contains("Balance due:      0.00"));
    assert!(!text.contains("Doctor Name"));
}

#[test]
fn notifications_address_the_patient() {
    let (invoice, appointment, _) = fixtures();
    let document = InvoiceDocument::new(&invoice, &appointment);

    let due = due_invoice_notification(&document, test_now());
    assert_eq!(due.recipient, "arjun@clinic.test");
    assert_eq!(due.kind, NotificationKind::InvoiceDue);
    assert_eq!(due.invoice_id, Some(invoice.id));

    let cancelled = cancellation_notification(&appointment, Some(dec!(522.50)), test_now());
    assert!(cancelled.body.contains("522.50 has been credited"));
    assert_eq!(cancelled.invoice_id, None);
}
