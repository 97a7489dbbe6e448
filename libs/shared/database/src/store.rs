use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use shared_models::{
    Appointment, AvailabilityWindow, BookingStatus, Doctor, GatewayOrder, Invoice, Patient,
    PaymentRecord, Prescription, Wallet,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Unique index over confirmed/completed appointments per (doctor, date, slot).
pub const CONFIRMED_SLOT_CONSTRAINT: &str = "appointments_confirmed_slot_key";

/// Equality filter over appointments. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub statuses: Vec<BookingStatus>,
}

impl AppointmentFilter {
    pub fn for_slot(doctor_id: Uuid, date: NaiveDate, time_slot: &str) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            date: Some(date),
            time_slot: Some(time_slot.to_string()),
            ..Self::default()
        }
    }

    pub fn for_day(doctor_id: Uuid, date: NaiveDate) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn with_patient(mut self, patient_id: Uuid) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    pub fn with_statuses(mut self, statuses: &[BookingStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.doctor_id.map_or(true, |id| appointment.doctor_id == id)
            && self.date.map_or(true, |date| appointment.date == date)
            && self
                .time_slot
                .as_deref()
                .map_or(true, |slot| appointment.time_slot == slot)
            && (self.statuses.is_empty() || self.statuses.contains(&appointment.booking_status))
    }
}

// ==============================================================================
// REPOSITORIES
// ==============================================================================

#[async_trait]
pub trait DoctorRepository: Send {
    async fn find_doctor(&mut self, doctor_id: Uuid) -> Result<Option<Doctor>, StoreError>;
    async fn insert_doctor(&mut self, doctor: Doctor) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PatientRepository: Send {
    async fn find_patient(&mut self, patient_id: Uuid) -> Result<Option<Patient>, StoreError>;
    async fn insert_patient(&mut self, patient: Patient) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AvailabilityRepository: Send {
    async fn find_availability(
        &mut self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityWindow>, StoreError>;
    async fn insert_availability(&mut self, window: AvailabilityWindow) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AppointmentRepository: Send {
    async fn find_appointment(&mut self, appointment_id: Uuid)
        -> Result<Option<Appointment>, StoreError>;
    async fn find_appointments(
        &mut self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, StoreError>;
    async fn insert_appointment(&mut self, appointment: Appointment) -> Result<(), StoreError>;
    async fn update_appointment(&mut self, appointment: Appointment) -> Result<(), StoreError>;
}

#[async_trait]
pub trait InvoiceRepository: Send {
    async fn find_invoice(&mut self, invoice_id: Uuid) -> Result<Option<Invoice>, StoreError>;
    async fn find_invoice_by_appointment(
        &mut self,
        appointment_id: Uuid,
    ) -> Result<Option<Invoice>, StoreError>;
    async fn insert_invoice(&mut self, invoice: Invoice) -> Result<(), StoreError>;
    async fn update_invoice(&mut self, invoice: Invoice) -> Result<(), StoreError>;
}

#[async_trait]
pub trait WalletRepository: Send {
    async fn find_wallet(&mut self, patient_id: Uuid) -> Result<Option<Wallet>, StoreError>;
    async fn save_wallet(&mut self, wallet: Wallet) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PaymentRepository: Send {
    async fn insert_gateway_order(&mut self, order: GatewayOrder) -> Result<(), StoreError>;
    async fn find_gateway_order(&mut self, order_ref: &str)
        -> Result<Option<GatewayOrder>, StoreError>;
    async fn insert_payment_record(&mut self, record: PaymentRecord) -> Result<(), StoreError>;
    async fn payment_records_for_invoice(
        &mut self,
        invoice_id: Uuid,
    ) -> Result<Vec<PaymentRecord>, StoreError>;
}

#[async_trait]
pub trait PrescriptionRepository: Send {
    async fn insert_prescription(&mut self, prescription: Prescription) -> Result<(), StoreError>;
    async fn find_prescription_by_appointment(
        &mut self,
        appointment_id: Uuid,
    ) -> Result<Option<Prescription>, StoreError>;
}

// ==============================================================================
// TRANSACTIONS
// ==============================================================================

/// A unit of work over every repository. Nothing is visible to other
/// transactions until `commit` succeeds; dropping without commit rolls back.
#[async_trait]
pub trait StoreTransaction:
    DoctorRepository
    + PatientRepository
    + AvailabilityRepository
    + AppointmentRepository
    + InvoiceRepository
    + WalletRepository
    + PaymentRepository
    + PrescriptionRepository
    + Send
{
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[cfg(test)]
impl std::fmt::Debug for dyn StoreTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoreTransaction")
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;
}
