use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use notification_cell::NotificationOutcome;
use shared_database::{StoreError, CONFIRMED_SLOT_CONSTRAINT};
use shared_models::error::AppError;
use shared_models::{Appointment, BookingStatus, GatewayOrder, Invoice, PaymentStatus, Wallet};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Confirmation posted back by the payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCallback {
    pub order_ref: String,
    pub payment_ref: String,
    #[serde(default)]
    pub signature: Option<String>,
}

// ==============================================================================
// RESULT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub invoice: Invoice,
    pub appointment: Appointment,
    /// Balance left after a wallet settlement.
    pub wallet: Option<Wallet>,
    pub notification: NotificationOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationReceipt {
    pub message: String,
    pub appointment: Appointment,
    pub invoice: Invoice,
    pub refund_amount: Option<Decimal>,
    pub notification: NotificationOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineOrder {
    pub order: GatewayOrder,
    pub key_id: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BillingError {
    #[error("Invoice not found")]
    InvoiceNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Wallet not found")]
    WalletNotFound,

    #[error("Gateway order {0} not found")]
    OrderNotFound(String),

    #[error("Invoice already paid")]
    AlreadyPaid,

    #[error("Invoice cannot be paid in status {0}")]
    InvoiceNotPayable(PaymentStatus),

    #[error("Insufficient wallet balance: {balance} available, {required} required")]
    InsufficientFunds { balance: Decimal, required: Decimal },

    #[error("Appointment is already cancelled")]
    AppointmentCancelled,

    #[error("Appointment is already completed")]
    AppointmentCompleted,

    #[error("Appointment is not confirmed")]
    NotConfirmed,

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidBookingTransition { from: BookingStatus, to: BookingStatus },

    #[error("Slot already taken")]
    SlotTaken,

    #[error("Payment signature missing or invalid")]
    InvalidSignature,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Payment gateway is not configured")]
    GatewayNotConfigured,

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for BillingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(constraint) if constraint == CONFIRMED_SLOT_CONSTRAINT => {
                BillingError::SlotTaken
            }
            other => BillingError::Database(other.to_string()),
        }
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvoiceNotFound
            | BillingError::AppointmentNotFound
            | BillingError::PatientNotFound
            | BillingError::WalletNotFound
            | BillingError::OrderNotFound(_) => AppError::NotFound(err.to_string()),
            BillingError::AlreadyPaid
            | BillingError::InvoiceNotPayable(_)
            | BillingError::AppointmentCancelled
            | BillingError::AppointmentCompleted
            | BillingError::NotConfirmed
            | BillingError::InvalidBookingTransition { .. }
            | BillingError::SlotTaken => AppError::Conflict(err.to_string()),
            BillingError::InsufficientFunds { .. } => AppError::InsufficientFunds(err.to_string()),
            BillingError::InvalidSignature | BillingError::ValidationError(_) => {
                AppError::ValidationError(err.to_string())
            }
            BillingError::GatewayNotConfigured | BillingError::Gateway(_) => {
                AppError::ExternalService(err.to_string())
            }
            BillingError::Database(msg) => AppError::Database(msg),
        }
    }
}

/// Identifies the owner of a wallet in responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletBalance {
    pub patient_id: Uuid,
    pub balance: Decimal,
}

impl From<Wallet> for WalletBalance {
    fn from(wallet: Wallet) -> Self {
        Self {
            patient_id: wallet.patient_id,
            balance: wallet.balance,
        }
    }
}
