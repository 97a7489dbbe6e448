use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{
    AppointmentRepository, AvailabilityRepository, DoctorRepository, InMemoryStore,
    PatientRepository, Store, StoreTransaction, WalletRepository,
};
use shared_models::{
    Appointment, AvailabilityWindow, BookingStatus, Doctor, Patient, PaymentStatus, Wallet,
};

use crate::clock::FixedClock;

pub struct TestConfig {
    pub slot_duration_minutes: i64,
    pub gateway_base_url: String,
    pub gateway_key_id: String,
    pub gateway_key_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            slot_duration_minutes: 30,
            gateway_base_url: "http://localhost:9999".to_string(),
            gateway_key_id: "rzp_test_key".to_string(),
            gateway_key_secret: "test-gateway-secret".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            slot_duration_minutes: self.slot_duration_minutes,
            gateway_base_url: self.gateway_base_url.clone(),
            gateway_key_id: self.gateway_key_id.clone(),
            gateway_key_secret: self.gateway_key_secret.clone(),
            notification_max_attempts: 2,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Noon on 2030-06-10, the fixed "now" of the test clinic.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, 10, 12, 0, 0)
        .single()
        .expect("valid fixed timestamp")
}

pub fn test_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(test_now()))
}

/// A seeded in-memory clinic for service and router tests.
pub struct TestClinic {
    pub store: Arc<InMemoryStore>,
    pub config: Arc<AppConfig>,
    pub clock: Arc<FixedClock>,
}

impl Default for TestClinic {
    fn default() -> Self {
        Self::new(TestConfig::default().to_app_config())
    }
}

impl TestClinic {
    pub fn new(config: AppConfig) -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            config: Arc::new(config),
            clock: test_clock(),
        }
    }

    pub fn tomorrow(&self) -> NaiveDate {
        test_now().date_naive() + Duration::days(1)
    }

    pub fn yesterday(&self) -> NaiveDate {
        test_now().date_naive() - Duration::days(1)
    }

    pub async fn add_doctor(&self, consultancy_charge: Decimal) -> Doctor {
        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Meera Nair".to_string(),
            specialization: "General Medicine".to_string(),
            email: format!("doctor-{}@clinic.test", Uuid::new_v4().simple()),
            consultancy_charge,
            approved: true,
        };
        let mut tx = self.store.begin().await.expect("begin");
        tx.insert_doctor(doctor.clone()).await.expect("insert doctor");
        tx.commit().await.expect("commit doctor");
        doctor
    }

    pub async fn add_unapproved_doctor(&self) -> Doctor {
        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Pending Review".to_string(),
            specialization: "Dermatology".to_string(),
            email: format!("doctor-{}@clinic.test", Uuid::new_v4().simple()),
            consultancy_charge: Decimal::from(300),
            approved: false,
        };
        let mut tx = self.store.begin().await.expect("begin");
        tx.insert_doctor(doctor.clone()).await.expect("insert doctor");
        tx.commit().await.expect("commit doctor");
        doctor
    }

    pub async fn add_patient(&self) -> Patient {
        let id = Uuid::new_v4();
        let patient = Patient {
            id,
            name: "Arjun Rao".to_string(),
            email: format!("patient-{}@clinic.test", id.simple()),
            phone: "+919800000000".to_string(),
        };
        let mut tx = self.store.begin().await.expect("begin");
        tx.insert_patient(patient.clone()).await.expect("insert patient");
        tx.commit().await.expect("commit patient");
        patient
    }

    /// Seeds a window such as `"09:00-10:00"` directly, bypassing validation.
    pub async fn add_availability(&self, doctor_id: Uuid, date: NaiveDate, window: &str) {
        let (start, end) = window.split_once('-').expect("window with separator");
        let parse = |raw: &str| NaiveTime::parse_from_str(raw, "%H:%M").expect("HH:MM time");
        let availability = AvailabilityWindow {
            id: Uuid::new_v4(),
            doctor_id,
            date,
            start_time: parse(start),
            end_time: parse(end),
            created_at: test_now(),
        };
        let mut tx = self.store.begin().await.expect("begin");
        tx.insert_availability(availability).await.expect("insert availability");
        tx.commit().await.expect("commit availability");
    }

    /// Seeds an appointment in the given status without an invoice.
    pub async fn add_appointment(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        date: NaiveDate,
        time_slot: &str,
        booking_status: BookingStatus,
    ) -> Appointment {
        let payment_status = if booking_status == BookingStatus::Pending {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Paid
        };
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            patient_email: "patient@clinic.test".to_string(),
            date,
            time_slot: time_slot.to_string(),
            health_issue: "Routine check-up".to_string(),
            booking_status,
            payment_status,
            created_at: test_now(),
            updated_at: test_now(),
        };
        let mut tx = self.store.begin().await.expect("begin");
        tx.insert_appointment(appointment.clone())
            .await
            .expect("insert appointment");
        tx.commit().await.expect("commit appointment");
        appointment
    }

    pub async fn set_wallet(&self, patient_id: Uuid, balance: Decimal) {
        let mut tx = self.store.begin().await.expect("begin");
        tx.save_wallet(Wallet {
            patient_id,
            balance,
            updated_at: test_now(),
        })
        .await
        .expect("save wallet");
        tx.commit().await.expect("commit wallet");
    }

    pub async fn wallet_balance(&self, patient_id: Uuid) -> Option<Decimal> {
        let mut tx = self.store.begin().await.expect("begin");
        tx.find_wallet(patient_id)
            .await
            .expect("find wallet")
            .map(|wallet| wallet.balance)
    }
}
