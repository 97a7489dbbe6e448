#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use rust_decimal::Decimal;
use tokio::sync::mpsc::Receiver;
use uuid::Uuid;

use billing_cell::*;
use notification_cell::{Notification, NotificationQueue};
use shared_database::{InvoiceRepository, Store, StoreTransaction};
use shared_models::{Appointment, BookingStatus, Invoice};
use shared_utils::test_utils::{test_now, TestClinic};

mock! {
    pub Gateway {}

    #[async_trait]
    impl PaymentGateway for Gateway {
        async fn create_order(&self, request: &OrderRequest) -> Result<OrderCreated, BillingError>;
        fn key_id(&self) -> String;
    }
}

pub struct Harness {
    pub clinic: TestClinic,
    pub settlement: PaymentSettlement,
    pub outbox: Receiver<Notification>,
}

pub fn harness_with_gateway(clinic: TestClinic, gateway: Arc<dyn PaymentGateway>) -> Harness {
    let (queue, outbox) = NotificationQueue::new(64);
    let settlement = PaymentSettlement::new(
        &clinic.config,
        clinic.store.clone(),
        clinic.clock.clone(),
        gateway,
        queue,
    );
    Harness {
        clinic,
        settlement,
        outbox,
    }
}

pub fn harness() -> Harness {
    let clinic = TestClinic::default();
    let gateway = Arc::new(RazorpayGateway::new(&clinic.config));
    harness_with_gateway(clinic, gateway)
}

/// Seeds an appointment in `status` with its pending invoice.
pub async fn seed_booking(
    clinic: &TestClinic,
    charge: Decimal,
    status: BookingStatus,
) -> (Appointment, Invoice) {
    let patient = clinic.add_patient().await;
    clinic.set_wallet(patient.id, Decimal::ZERO).await;
    seed_booking_for(clinic, patient.id, charge, status).await
}

/// Seeds another booking for an existing patient, with a fresh doctor.
pub async fn seed_booking_for(
    clinic: &TestClinic,
    patient_id: Uuid,
    charge: Decimal,
    status: BookingStatus,
) -> (Appointment, Invoice) {
    let doctor = clinic.add_doctor(charge).await;
    let appointment = clinic
        .add_appointment(patient_id, doctor.id, clinic.tomorrow(), "09:00-09:30", status)
        .await;

    let mut tx = clinic.store.begin().await.expect("begin");
    let invoice = InvoiceService::new(&clinic.config)
        .open_invoice(tx.as_mut(), &appointment, charge, test_now())
        .await
        .expect("open invoice");
    tx.commit().await.expect("commit");
    (appointment, invoice)
}

pub async fn reload_invoice(clinic: &TestClinic, invoice_id: Uuid) -> Invoice {
    let mut tx = clinic.store.begin().await.expect("begin");
    tx.find_invoice(invoice_id)
        .await
        .expect("find invoice")
        .expect("invoice exists")
}
