mod common;

use assert_matches::assert_matches;
use chrono::Duration;
use futures::future::join_all;
use rust_decimal_macros::dec;
use uuid::Uuid;

use appointment_cell::*;
use billing_cell::BillingError;
use notification_cell::{NotificationKind, NotificationOutcome, NotificationQueue};
use shared_models::{BookingStatus, PaymentMethod, PaymentStatus};
use shared_utils::test_utils::{test_now, TestClinic};

use common::{booking_request, desk, desk_with_queue, open_doctor};

#[tokio::test]
async fn test_booking_opens_pending_invoice_and_queues_notice() {
    let mut d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let patient = d.clinic.add_patient().await;

    let confirmation = d
        .booking
        .request_booking(booking_request(&patient, &doctor, date, "09:00-09:30"))
        .await
        .expect("booked");

    assert_eq!(confirmation.appointment.booking_status, BookingStatus::Pending);
    assert_eq!(confirmation.appointment.payment_status, PaymentStatus::Pending);
    assert_eq!(confirmation.invoice.total_amount, dec!(550));
    assert_eq!(confirmation.invoice.payment_method, PaymentMethod::Pending);
    assert_eq!(confirmation.invoice.due_date, test_now() + Duration::days(1));
    assert_eq!(confirmation.invoice.appointment_id, confirmation.appointment.id);
    assert_eq!(confirmation.notification, NotificationOutcome::Queued);

    let notice = d.outbox.recv().await.expect("due notice");
    assert_eq!(notice.kind, NotificationKind::InvoiceDue);
    assert_eq!(notice.recipient, patient.email);
    assert!(notice.body.contains("550.00"));
}

#[tokio::test]
async fn test_past_and_unavailable_dates_are_rejected() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let patient = d.clinic.add_patient().await;

    let past = booking_request(&patient, &doctor, d.clinic.yesterday(), "09:00-09:30");
    assert_matches!(
        d.booking.request_booking(past).await,
        Err(BookingError::PastDate(_))
    );

    let other_day = date + Duration::days(1);
    let closed = booking_request(&patient, &doctor, other_day, "09:00-09:30");
    assert_matches!(
        d.booking.request_booking(closed).await,
        Err(BookingError::AvailabilityNotFound(day)) if day == other_day
    );
}

#[tokio::test]
async fn test_slot_that_started_earlier_today_is_rejected() {
    // The fixed clock reads 12:00 on this day.
    let d = desk();
    let doctor = d.clinic.add_doctor(dec!(500)).await;
    let patient = d.clinic.add_patient().await;
    let today = test_now().date_naive();
    d.clinic.add_availability(doctor.id, today, "09:00-13:00").await;

    assert_matches!(
        d.booking
            .request_booking(booking_request(&patient, &doctor, today, "09:00-09:30"))
            .await,
        Err(BookingError::SlotStarted(slot)) if slot == "09:00-09:30"
    );
    assert_matches!(
        d.booking
            .request_booking(booking_request(&patient, &doctor, today, "11:30-12:00"))
            .await,
        Err(BookingError::SlotStarted(_))
    );

    let confirmation = d
        .booking
        .request_booking(booking_request(&patient, &doctor, today, "12:00-12:30"))
        .await
        .expect("slot starting now is still bookable");
    assert_eq!(confirmation.appointment.date, today);
}

#[tokio::test]
async fn test_slot_must_belong_to_the_window() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let patient = d.clinic.add_patient().await;

    for slot in ["10:00-10:30", "09:15-09:45", "09:00-10:00", "nine o'clock"] {
        assert_matches!(
            d.booking
                .request_booking(booking_request(&patient, &doctor, date, slot))
                .await,
            Err(BookingError::InvalidSlot(_)),
            "slot {slot} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_pending_claims_do_not_hold_the_slot() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let first = d.clinic.add_patient().await;
    let second = d.clinic.add_patient().await;

    d.booking
        .request_booking(booking_request(&first, &doctor, date, "09:00-09:30"))
        .await
        .expect("first claim");
    tokio_test::assert_ok!(
        d.booking
            .request_booking(booking_request(&second, &doctor, date, "09:00-09:30"))
            .await
    );
}

#[tokio::test]
async fn test_confirmed_slot_blocks_new_bookings() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let holder = d.clinic.add_patient().await;
    d.clinic
        .add_appointment(holder.id, doctor.id, date, "09:30-10:00", BookingStatus::Confirmed)
        .await;

    let patient = d.clinic.add_patient().await;
    assert_matches!(
        d.booking
            .request_booking(booking_request(&patient, &doctor, date, "09:30-10:00"))
            .await,
        Err(BookingError::SlotTaken)
    );
}

#[tokio::test]
async fn test_one_active_booking_per_patient_doctor_and_day() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let patient = d.clinic.add_patient().await;

    d.booking
        .request_booking(booking_request(&patient, &doctor, date, "09:00-09:30"))
        .await
        .expect("first booking");
    assert_matches!(
        d.booking
            .request_booking(booking_request(&patient, &doctor, date, "09:30-10:00"))
            .await,
        Err(BookingError::DuplicateBooking)
    );
}

#[tokio::test]
async fn test_cancelled_booking_frees_the_patient_to_rebook() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let patient = d.clinic.add_patient().await;
    d.clinic
        .add_appointment(patient.id, doctor.id, date, "09:00-09:30", BookingStatus::Cancelled)
        .await;

    d.booking
        .request_booking(booking_request(&patient, &doctor, date, "09:00-09:30"))
        .await
        .expect("rebooked after cancellation");
}

#[tokio::test]
async fn test_unknown_patient_and_bad_input() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let patient = d.clinic.add_patient().await;

    let mut stranger = booking_request(&patient, &doctor, date, "09:00-09:30");
    stranger.patient_id = Uuid::new_v4();
    assert_matches!(
        d.booking.request_booking(stranger).await,
        Err(BookingError::PatientNotFound)
    );

    let mut blank = booking_request(&patient, &doctor, date, "09:00-09:30");
    blank.health_issue = "  ".to_string();
    assert_matches!(
        d.booking.request_booking(blank).await,
        Err(BookingError::ValidationError(_))
    );

    let mut no_email = booking_request(&patient, &doctor, date, "09:00-09:30");
    no_email.email = "nobody".to_string();
    assert_matches!(
        d.booking.request_booking(no_email).await,
        Err(BookingError::ValidationError(_))
    );
}

#[tokio::test]
async fn test_closed_outbox_still_books() {
    let (queue, outbox) = NotificationQueue::new(4);
    drop(outbox);
    let clinic = TestClinic::default();
    let (doctor, date) = open_doctor(&clinic, dec!(500)).await;
    let patient = clinic.add_patient().await;
    let (_, unused) = NotificationQueue::new(1);
    let d = desk_with_queue(clinic, queue, unused);

    let confirmation = d
        .booking
        .request_booking(booking_request(&patient, &doctor, date, "09:00-09:30"))
        .await
        .expect("booking survives notification failure");

    assert_matches!(confirmation.notification, NotificationOutcome::Failed(_));
    let details = d
        .booking
        .get_appointment(confirmation.appointment.id)
        .await
        .expect("stored");
    assert_eq!(details.invoice.map(|i| i.id), Some(confirmation.invoice.id));
}

#[tokio::test]
async fn test_outage_surfaces_as_database_error() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let patient = d.clinic.add_patient().await;
    d.clinic.store.set_available(false);

    assert_matches!(
        d.booking
            .request_booking(booking_request(&patient, &doctor, date, "09:00-09:30"))
            .await,
        Err(BookingError::Database(_))
    );
}

// ==============================================================================
// CONCURRENT SETTLEMENT
// ==============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_payments_confirm_exactly_one_claim() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;

    let mut invoices = Vec::new();
    for _ in 0..8 {
        let patient = d.clinic.add_patient().await;
        let confirmation = d
            .booking
            .request_booking(booking_request(&patient, &doctor, date, "09:00-09:30"))
            .await
            .expect("pending claim");
        invoices.push(confirmation.invoice.id);
    }

    let attempts = invoices.iter().map(|invoice_id| {
        let settlement = d.settlement.clone();
        let invoice_id = *invoice_id;
        tokio::spawn(async move { settlement.settle_offline(invoice_id).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task finished"))
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert_matches!(result, Err(BillingError::SlotTaken));
    }

    // Losing claims keep their pending invoices.
    let mut paid = 0;
    for invoice_id in invoices {
        let invoice = d.settlement.get_invoice(invoice_id).await.expect("invoice");
        if invoice.payment_status == PaymentStatus::Paid {
            paid += 1;
        }
    }
    assert_eq!(paid, 1);
}
