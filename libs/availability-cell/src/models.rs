use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub date: NaiveDate,
    /// Window in `HH:MM-HH:MM` form.
    pub available_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableSlotsResponse {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub available_time: String,
    pub slots: Vec<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AvailabilityError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor is not approved")]
    DoctorNotApproved,

    #[error("No availability for doctor on {0}")]
    WindowNotFound(NaiveDate),

    #[error("Availability already exists for {0}")]
    WindowExists(NaiveDate),

    #[error("Date {0} is in the past")]
    PastDate(NaiveDate),

    #[error("Invalid availability window: {0}")]
    InvalidWindow(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for AvailabilityError {
    fn from(err: StoreError) -> Self {
        AvailabilityError::Database(err.to_string())
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::DoctorNotFound | AvailabilityError::WindowNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            AvailabilityError::WindowExists(_) => AppError::Conflict(err.to_string()),
            AvailabilityError::DoctorNotApproved
            | AvailabilityError::PastDate(_)
            | AvailabilityError::InvalidWindow(_) => AppError::ValidationError(err.to_string()),
            AvailabilityError::Database(msg) => AppError::Database(msg),
        }
    }
}
