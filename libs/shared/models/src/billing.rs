use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// INVOICES
// ==============================================================================

/// One invoice per appointment. `total_amount` is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Uuid,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

/// Payment state shared by invoices and appointments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Paid")]
    Paid,
    #[serde(alias = "Refunded")]
    Refunded,
}

impl PaymentStatus {
    pub fn valid_transitions(&self) -> &'static [PaymentStatus] {
        match self {
            PaymentStatus::Pending => &[PaymentStatus::Paid],
            PaymentStatus::Paid => &[PaymentStatus::Refunded],
            PaymentStatus::Refunded => &[],
        }
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Offline")]
    Offline,
    #[serde(alias = "Online")]
    Online,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Pending => write!(f, "pending"),
            PaymentMethod::Offline => write!(f, "offline"),
            PaymentMethod::Online => write!(f, "online"),
        }
    }
}

// ==============================================================================
// WALLETS AND GATEWAY RECEIPTS
// ==============================================================================

/// Stored-value balance, one per patient. Balance never goes below zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wallet {
    pub patient_id: Uuid,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Order opened with the payment gateway for a pending invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayOrder {
    pub order_ref: String,
    pub invoice_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only receipt of a confirmed gateway payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount_paid: Decimal,
    pub order_ref: String,
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}
