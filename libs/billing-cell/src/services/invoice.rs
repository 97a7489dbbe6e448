use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{InvoiceRepository, StoreTransaction};
use shared_models::{Appointment, Invoice, PaymentMethod, PaymentStatus};

use crate::models::BillingError;

/// Owns invoice amounts and the Pending -> Paid -> Refunded lifecycle.
/// Every method works inside the caller's transaction.
#[derive(Debug, Clone)]
pub struct InvoiceService {
    surcharge: Decimal,
    refund_rate: Decimal,
    due_days: i64,
}

impl InvoiceService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            surcharge: config.booking_surcharge,
            refund_rate: config.cancellation_refund_rate,
            due_days: config.invoice_due_days,
        }
    }

    /// Consultancy charge plus the flat booking surcharge.
    pub fn total_for(&self, consultancy_charge: Decimal) -> Decimal {
        consultancy_charge + self.surcharge
    }

    /// Refund owed on cancelling an online-paid invoice, to the cent.
    pub fn refund_for(&self, total: Decimal) -> Decimal {
        (total * self.refund_rate).round_dp(2)
    }

    pub async fn open_invoice(
        &self,
        tx: &mut dyn StoreTransaction,
        appointment: &Appointment,
        consultancy_charge: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Invoice, BillingError> {
        let invoice = Invoice {
            id: Uuid::new_v4(),
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            appointment_id: appointment.id,
            total_amount: self.total_for(consultancy_charge),
            payment_method: PaymentMethod::Pending,
            payment_status: PaymentStatus::Pending,
            due_date: now + Duration::days(self.due_days),
            created_at: now,
            updated_at: now,
        };

        tx.insert_invoice(invoice.clone()).await?;
        debug!(
            "Opened invoice {} for appointment {}: {}",
            invoice.id, appointment.id, invoice.total_amount
        );
        Ok(invoice)
    }

    pub async fn find(
        &self,
        tx: &mut dyn StoreTransaction,
        invoice_id: Uuid,
    ) -> Result<Invoice, BillingError> {
        tx.find_invoice(invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound)
    }

    /// Rejects an invoice that is already paid; "already paid" is never
    /// silently ignored.
    pub async fn mark_paid(
        &self,
        tx: &mut dyn StoreTransaction,
        invoice_id: Uuid,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<Invoice, BillingError> {
        let mut invoice = self.find(tx, invoice_id).await?;
        ensure_payable(&invoice)?;

        invoice.payment_status = PaymentStatus::Paid;
        invoice.payment_method = method;
        invoice.updated_at = now;
        tx.update_invoice(invoice.clone()).await?;

        info!("Invoice {} paid via {}", invoice.id, method);
        Ok(invoice)
    }

    pub async fn mark_refunded(
        &self,
        tx: &mut dyn StoreTransaction,
        mut invoice: Invoice,
        now: DateTime<Utc>,
    ) -> Result<Invoice, BillingError> {
        if !invoice.payment_status.can_transition_to(PaymentStatus::Refunded) {
            return Err(BillingError::InvoiceNotPayable(invoice.payment_status));
        }

        invoice.payment_status = PaymentStatus::Refunded;
        invoice.updated_at = now;
        tx.update_invoice(invoice.clone()).await?;

        info!("Invoice {} refunded", invoice.id);
        Ok(invoice)
    }
}

/// Only a pending invoice may be settled.
pub fn ensure_payable(invoice: &Invoice) -> Result<(), BillingError> {
    match invoice.payment_status {
        PaymentStatus::Pending => Ok(()),
        PaymentStatus::Paid => {
            warn!("Invoice {} already paid", invoice.id);
            Err(BillingError::AlreadyPaid)
        }
        other => Err(BillingError::InvoiceNotPayable(other)),
    }
}
