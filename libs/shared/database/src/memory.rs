use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::{
    Appointment, AvailabilityWindow, Doctor, GatewayOrder, Invoice, Patient, PaymentRecord,
    Prescription, Wallet,
};

use crate::store::{
    AppointmentFilter, AppointmentRepository, AvailabilityRepository, DoctorRepository,
    InvoiceRepository, PatientRepository, PaymentRepository, PrescriptionRepository, Store,
    StoreError, StoreTransaction, WalletRepository, CONFIRMED_SLOT_CONSTRAINT,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    doctors: HashMap<Uuid, Doctor>,
    patients: HashMap<Uuid, Patient>,
    availability: HashMap<(Uuid, NaiveDate), AvailabilityWindow>,
    appointments: HashMap<Uuid, Appointment>,
    invoices: HashMap<Uuid, Invoice>,
    wallets: HashMap<Uuid, Wallet>,
    gateway_orders: HashMap<String, GatewayOrder>,
    payment_records: Vec<PaymentRecord>,
    prescriptions: Vec<Prescription>,
}

impl Tables {
    /// Enforced at commit time, like a deferred unique index.
    fn check_constraints(&self) -> Result<(), StoreError> {
        let mut taken = HashSet::new();
        for appointment in self.appointments.values().filter(|a| a.holds_slot()) {
            let key = (appointment.doctor_id, appointment.date, appointment.time_slot.as_str());
            if !taken.insert(key) {
                return Err(StoreError::UniqueViolation(CONFIRMED_SLOT_CONSTRAINT.to_string()));
            }
        }
        Ok(())
    }
}

/// Process-local store. Transactions are serialised: a transaction holds the
/// table lock from `begin` until commit or drop and works on a private copy.
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    available: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulates an outage: `begin` fails while unavailable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            warn!("In-memory store marked unavailable, refusing transaction");
            return Err(StoreError::Unavailable("store is not accepting connections".to_string()));
        }

        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, working } = *self;
        working.check_constraints()?;
        *guard = working;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        debug!("Transaction rolled back");
        Ok(())
    }
}

#[async_trait]
impl DoctorRepository for MemoryTransaction {
    async fn find_doctor(&mut self, doctor_id: Uuid) -> Result<Option<Doctor>, StoreError> {
        Ok(self.working.doctors.get(&doctor_id).cloned())
    }

    async fn insert_doctor(&mut self, doctor: Doctor) -> Result<(), StoreError> {
        if self.working.doctors.contains_key(&doctor.id) {
            return Err(StoreError::UniqueViolation("doctors_pkey".to_string()));
        }
        self.working.doctors.insert(doctor.id, doctor);
        Ok(())
    }
}

#[async_trait]
impl PatientRepository for MemoryTransaction {
    async fn find_patient(&mut self, patient_id: Uuid) -> Result<Option<Patient>, StoreError> {
        Ok(self.working.patients.get(&patient_id).cloned())
    }

    async fn insert_patient(&mut self, patient: Patient) -> Result<(), StoreError> {
        if self.working.patients.contains_key(&patient.id) {
            return Err(StoreError::UniqueViolation("patients_pkey".to_string()));
        }
        self.working.patients.insert(patient.id, patient);
        Ok(())
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryTransaction {
    async fn find_availability(
        &mut self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityWindow>, StoreError> {
        Ok(self.working.availability.get(&(doctor_id, date)).cloned())
    }

    async fn insert_availability(&mut self, window: AvailabilityWindow) -> Result<(), StoreError> {
        let key = (window.doctor_id, window.date);
        if self.working.availability.contains_key(&key) {
            return Err(StoreError::UniqueViolation(
                "doctor_availability_doctor_date_key".to_string(),
            ));
        }
        self.working.availability.insert(key, window);
        Ok(())
    }
}

#[async_trait]
impl AppointmentRepository for MemoryTransaction {
    async fn find_appointment(
        &mut self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, StoreError> {
        Ok(self.working.appointments.get(&appointment_id).cloned())
    }

    async fn find_appointments(
        &mut self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut found: Vec<Appointment> = self
            .working
            .appointments
            .values()
            .filter(|appointment| filter.matches(appointment))
            .cloned()
            .collect();
        found.sort_by_key(|appointment| appointment.created_at);
        Ok(found)
    }

    async fn insert_appointment(&mut self, appointment: Appointment) -> Result<(), StoreError> {
        if self.working.appointments.contains_key(&appointment.id) {
            return Err(StoreError::UniqueViolation("appointments_pkey".to_string()));
        }
        self.working.appointments.insert(appointment.id, appointment);
        Ok(())
    }

    async fn update_appointment(&mut self, appointment: Appointment) -> Result<(), StoreError> {
        match self.working.appointments.get_mut(&appointment.id) {
            Some(existing) => {
                *existing = appointment;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("appointment {}", appointment.id))),
        }
    }
}

#[async_trait]
impl InvoiceRepository for MemoryTransaction {
    async fn find_invoice(&mut self, invoice_id: Uuid) -> Result<Option<Invoice>, StoreError> {
        Ok(self.working.invoices.get(&invoice_id).cloned())
    }

    async fn find_invoice_by_appointment(
        &mut self,
        appointment_id: Uuid,
    ) -> Result<Option<Invoice>, StoreError> {
        Ok(self
            .working
            .invoices
            .values()
            .find(|invoice| invoice.appointment_id == appointment_id)
            .cloned())
    }

    async fn insert_invoice(&mut self, invoice: Invoice) -> Result<(), StoreError> {
        let duplicate = self.working.invoices.contains_key(&invoice.id)
            || self
                .working
                .invoices
                .values()
                .any(|existing| existing.appointment_id == invoice.appointment_id);
        if duplicate {
            return Err(StoreError::UniqueViolation("invoices_appointment_id_key".to_string()));
        }
        self.working.invoices.insert(invoice.id, invoice);
        Ok(())
    }

    async fn update_invoice(&mut self, invoice: Invoice) -> Result<(), StoreError> {
        match self.working.invoices.get_mut(&invoice.id) {
            Some(existing) => {
                *existing = invoice;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("invoice {}", invoice.id))),
        }
    }
}

#[async_trait]
impl WalletRepository for MemoryTransaction {
    async fn find_wallet(&mut self, patient_id: Uuid) -> Result<Option<Wallet>, StoreError> {
        Ok(self.working.wallets.get(&patient_id).cloned())
    }

    async fn save_wallet(&mut self, wallet: Wallet) -> Result<(), StoreError> {
        self.working.wallets.insert(wallet.patient_id, wallet);
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for MemoryTransaction {
    async fn insert_gateway_order(&mut self, order: GatewayOrder) -> Result<(), StoreError> {
        if self.working.gateway_orders.contains_key(&order.order_ref) {
            return Err(StoreError::UniqueViolation("gateway_orders_pkey".to_string()));
        }
        self.working.gateway_orders.insert(order.order_ref.clone(), order);
        Ok(())
    }

    async fn find_gateway_order(
        &mut self,
        order_ref: &str,
    ) -> Result<Option<GatewayOrder>, StoreError> {
        Ok(self.working.gateway_orders.get(order_ref).cloned())
    }

    async fn insert_payment_record(&mut self, record: PaymentRecord) -> Result<(), StoreError> {
        self.working.payment_records.push(record);
        Ok(())
    }

    async fn payment_records_for_invoice(
        &mut self,
        invoice_id: Uuid,
    ) -> Result<Vec<PaymentRecord>, StoreError> {
        Ok(self
            .working
            .payment_records
            .iter()
            .filter(|record| record.invoice_id == invoice_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PrescriptionRepository for MemoryTransaction {
    async fn insert_prescription(&mut self, prescription: Prescription) -> Result<(), StoreError> {
        self.working.prescriptions.push(prescription);
        Ok(())
    }

    async fn find_prescription_by_appointment(
        &mut self,
        appointment_id: Uuid,
    ) -> Result<Option<Prescription>, StoreError> {
        Ok(self
            .working
            .prescriptions
            .iter()
            .find(|prescription| prescription.appointment_id == appointment_id)
            .cloned())
    }
}
