use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::{Doctor, Patient, Wallet};

use crate::store::{DoctorRepository, PatientRepository, Store, StoreError, WalletRepository};

// ==============================================================================
// CLINIC DIRECTORY
// ==============================================================================

/// Doctors and patients registered outside this service, loaded at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClinicDirectory {
    #[serde(default)]
    pub doctors: Vec<Doctor>,
    #[serde(default)]
    pub patients: Vec<Patient>,
    /// Opening balances. Listed patients without one start at zero.
    #[serde(default)]
    pub wallets: Vec<OpeningBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpeningBalance {
    pub patient_id: Uuid,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub doctors: usize,
    pub patients: usize,
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Invalid clinic directory: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Opening balance for unknown patient {0}")]
    UnknownPatient(Uuid),

    #[error("Negative opening balance for patient {0}")]
    NegativeBalance(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ClinicDirectory {
    pub fn from_json(raw: &str) -> Result<Self, DirectoryError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Inserts records the store does not hold yet, in one transaction.
    /// Existing doctors, patients and wallets are left untouched.
    pub async fn seed(&self, store: &dyn Store, now: DateTime<Utc>) -> Result<SeedSummary, DirectoryError> {
        for opening in &self.wallets {
            if !self.patients.iter().any(|p| p.id == opening.patient_id) {
                return Err(DirectoryError::UnknownPatient(opening.patient_id));
            }
            if opening.balance < Decimal::ZERO {
                return Err(DirectoryError::NegativeBalance(opening.patient_id));
            }
        }

        let mut tx = store.begin().await?;
        let mut summary = SeedSummary { doctors: 0, patients: 0 };

        for doctor in &self.doctors {
            if tx.find_doctor(doctor.id).await?.is_some() {
                debug!("Doctor {} already present", doctor.id);
                continue;
            }
            tx.insert_doctor(doctor.clone()).await?;
            summary.doctors += 1;
        }

        for patient in &self.patients {
            if tx.find_patient(patient.id).await?.is_none() {
                tx.insert_patient(patient.clone()).await?;
                summary.patients += 1;
            }
            if tx.find_wallet(patient.id).await?.is_none() {
                let balance = self
                    .wallets
                    .iter()
                    .find(|w| w.patient_id == patient.id)
                    .map(|w| w.balance)
                    .unwrap_or(Decimal::ZERO);
                tx.save_wallet(Wallet {
                    patient_id: patient.id,
                    balance,
                    updated_at: now,
                })
                .await?;
            }
        }

        tx.commit().await?;
        info!(
            "Clinic directory seeded: {} doctors, {} patients",
            summary.doctors, summary.patients
        );
        Ok(summary)
    }
}
