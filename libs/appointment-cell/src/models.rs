use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use billing_cell::BillingError;
use notification_cell::NotificationOutcome;
use shared_database::{StoreError, CONFIRMED_SLOT_CONSTRAINT};
use shared_models::error::AppError;
use shared_models::{Appointment, BookingStatus, Invoice, Prescription};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: String,
    pub health_issue: String,
    /// Where the invoice is sent.
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub prescription_text: String,
}

// ==============================================================================
// RESULT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub appointment: Appointment,
    pub invoice: Invoice,
    pub notification: NotificationOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub appointment: Appointment,
    pub invoice: Option<Invoice>,
    pub prescription: Option<Prescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedVisit {
    pub appointment: Appointment,
    pub prescription: Prescription,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Cannot book a date in the past: {0}")]
    PastDate(NaiveDate),

    #[error("Time slot {0} has already started")]
    SlotStarted(String),

    #[error("Doctor has no availability on {0}")]
    AvailabilityNotFound(NaiveDate),

    #[error("Time slot {0} is not offered on this date")]
    InvalidSlot(String),

    #[error("Slot already taken")]
    SlotTaken,

    #[error("Patient already has an appointment with this doctor on this date")]
    DuplicateBooking,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Appointment is not confirmed")]
    NotConfirmed,

    #[error("Prescription already added")]
    PrescriptionExists,

    #[error("Appointment is cancelled")]
    AppointmentCancelled,

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition { from: BookingStatus, to: BookingStatus },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(constraint) if constraint == CONFIRMED_SLOT_CONSTRAINT => {
                BookingError::SlotTaken
            }
            other => BookingError::Database(other.to_string()),
        }
    }
}

impl From<BillingError> for BookingError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Database(msg) => BookingError::Database(msg),
            other => BookingError::ValidationError(other.to_string()),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::PastDate(_)
            | BookingError::SlotStarted(_)
            | BookingError::InvalidSlot(_)
            | BookingError::ValidationError(_) => AppError::ValidationError(err.to_string()),
            BookingError::AvailabilityNotFound(_)
            | BookingError::PatientNotFound
            | BookingError::DoctorNotFound
            | BookingError::AppointmentNotFound => AppError::NotFound(err.to_string()),
            BookingError::SlotTaken
            | BookingError::DuplicateBooking
            | BookingError::NotConfirmed
            | BookingError::PrescriptionExists
            | BookingError::AppointmentCancelled
            | BookingError::InvalidStatusTransition { .. } => AppError::Conflict(err.to_string()),
            BookingError::Database(msg) => AppError::Database(msg),
        }
    }
}
