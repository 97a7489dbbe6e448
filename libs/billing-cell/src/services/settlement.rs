use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notification_cell::{
    cancellation_notification, paid_invoice_notification, InvoiceDocument, NotificationQueue,
};
use shared_config::AppConfig;
use shared_database::{
    AppointmentRepository, InvoiceRepository, PatientRepository, PaymentRepository, Store,
    StoreTransaction, WalletRepository,
};
use shared_models::{
    Appointment, BookingStatus, GatewayOrder, Invoice, PaymentMethod, PaymentRecord,
    PaymentStatus, Wallet,
};
use shared_utils::Clock;

use crate::models::{
    BillingError, CancellationReceipt, GatewayCallback, OnlineOrder, SettlementReceipt,
};
use crate::services::gateway::{verify_payment_signature, OrderRequest, PaymentGateway};
use crate::services::invoice::{ensure_payable, InvoiceService};
use crate::services::wallet::WalletLedger;

/// Drives every payment path and cancellation. Each operation commits its
/// financial changes in one transaction and only then queues a notification.
pub struct PaymentSettlement {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: NotificationQueue,
    invoices: InvoiceService,
    wallets: WalletLedger,
    currency: String,
    gateway_secret: String,
    gateway_configured: bool,
}

impl PaymentSettlement {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: NotificationQueue,
    ) -> Self {
        Self {
            store,
            clock,
            gateway,
            notifier,
            invoices: InvoiceService::new(config),
            wallets: WalletLedger,
            currency: config.gateway_currency.clone(),
            gateway_secret: config.gateway_key_secret.clone(),
            gateway_configured: config.is_gateway_configured(),
        }
    }

    // ==========================================================================
    // SETTLEMENT
    // ==========================================================================

    #[instrument(skip(self))]
    pub async fn settle_offline(&self, invoice_id: Uuid) -> Result<SettlementReceipt, BillingError> {
        let mut tx = self.store.begin().await?;
        let (invoice, appointment) = self
            .confirm_payment(tx.as_mut(), invoice_id, PaymentMethod::Offline)
            .await?;
        tx.commit().await?;

        info!("Invoice {} settled offline", invoice.id);
        Ok(self.paid_receipt(invoice, appointment, None))
    }

    /// Debit, invoice update and appointment update commit together or not at all.
    #[instrument(skip(self))]
    pub async fn settle_wallet(&self, invoice_id: Uuid) -> Result<SettlementReceipt, BillingError> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        // Wallet payments are refundable like gateway payments.
        let (invoice, appointment) = self
            .confirm_payment(tx.as_mut(), invoice_id, PaymentMethod::Online)
            .await?;
        let wallet = self
            .wallets
            .debit(tx.as_mut(), invoice.patient_id, invoice.total_amount, now)
            .await?;
        tx.commit().await?;

        info!(
            "Invoice {} settled from wallet, balance now {}",
            invoice.id, wallet.balance
        );
        Ok(self.paid_receipt(invoice, appointment, Some(wallet)))
    }

    /// Opens a gateway order for a pending invoice. The store is not held
    /// across the gateway call.
    #[instrument(skip(self))]
    pub async fn create_online_order(&self, invoice_id: Uuid) -> Result<OnlineOrder, BillingError> {
        let invoice = {
            let mut tx = self.store.begin().await?;
            let invoice = self.invoices.find(tx.as_mut(), invoice_id).await?;
            tx.rollback().await?;
            invoice
        };
        ensure_payable(&invoice)?;

        let request = OrderRequest {
            amount: minor_units(invoice.total_amount)?,
            currency: self.currency.clone(),
            receipt: invoice.id.to_string(),
        };
        let created = self.gateway.create_order(&request).await?;

        let order = GatewayOrder {
            order_ref: created.id,
            invoice_id: invoice.id,
            amount_minor: request.amount,
            currency: request.currency,
            created_at: self.clock.now(),
        };
        let mut tx = self.store.begin().await?;
        tx.insert_gateway_order(order.clone()).await?;
        tx.commit().await?;

        info!("Gateway order {} opened for invoice {}", order.order_ref, invoice.id);
        Ok(OnlineOrder {
            order,
            key_id: self.gateway.key_id(),
        })
    }

    /// Gateway confirmation. Callbacks must carry a valid signature. A callback
    /// that never arrives leaves the invoice pending.
    #[instrument(skip(self, callback), fields(order_ref = %callback.order_ref))]
    pub async fn settle_online(
        &self,
        callback: GatewayCallback,
    ) -> Result<SettlementReceipt, BillingError> {
        if !self.gateway_configured {
            warn!("Gateway callback received without gateway credentials");
            return Err(BillingError::GatewayNotConfigured);
        }
        let signature = callback
            .signature
            .as_deref()
            .ok_or(BillingError::InvalidSignature)?;
        verify_payment_signature(
            &self.gateway_secret,
            &callback.order_ref,
            &callback.payment_ref,
            signature,
        )?;

        let mut tx = self.store.begin().await?;
        let order = tx
            .find_gateway_order(&callback.order_ref)
            .await?
            .ok_or_else(|| BillingError::OrderNotFound(callback.order_ref.clone()))?;

        let (invoice, appointment) = self
            .confirm_payment(tx.as_mut(), order.invoice_id, PaymentMethod::Online)
            .await?;
        tx.insert_payment_record(PaymentRecord {
            id: Uuid::new_v4(),
            invoice_id: invoice.id,
            amount_paid: invoice.total_amount,
            order_ref: order.order_ref,
            payment_ref: Some(callback.payment_ref),
            created_at: self.clock.now(),
        })
        .await?;
        tx.commit().await?;

        info!("Invoice {} settled online", invoice.id);
        Ok(self.paid_receipt(invoice, appointment, None))
    }

    /// Marks the invoice paid and confirms its appointment. The appointment
    /// status is re-read here so a concurrent cancellation wins cleanly.
    async fn confirm_payment(
        &self,
        tx: &mut dyn StoreTransaction,
        invoice_id: Uuid,
        method: PaymentMethod,
    ) -> Result<(Invoice, Appointment), BillingError> {
        let now = self.clock.now();
        let invoice = self.invoices.mark_paid(tx, invoice_id, method, now).await?;

        let mut appointment = tx
            .find_appointment(invoice.appointment_id)
            .await?
            .ok_or(BillingError::AppointmentNotFound)?;
        match appointment.booking_status {
            BookingStatus::Cancelled => return Err(BillingError::AppointmentCancelled),
            BookingStatus::Completed => return Err(BillingError::AppointmentCompleted),
            status if !status.can_transition_to(BookingStatus::Confirmed) => {
                return Err(BillingError::InvalidBookingTransition {
                    from: status,
                    to: BookingStatus::Confirmed,
                })
            }
            _ => {}
        }

        appointment.booking_status = BookingStatus::Confirmed;
        appointment.payment_status = PaymentStatus::Paid;
        appointment.updated_at = now;
        tx.update_appointment(appointment.clone()).await?;

        Ok((invoice, appointment))
    }

    fn paid_receipt(
        &self,
        invoice: Invoice,
        appointment: Appointment,
        wallet: Option<Wallet>,
    ) -> SettlementReceipt {
        let document = InvoiceDocument::new(&invoice, &appointment);
        let notification = self
            .notifier
            .dispatch(paid_invoice_notification(&document, self.clock.now()));

        SettlementReceipt {
            invoice,
            appointment,
            wallet,
            notification,
        }
    }

    // ==========================================================================
    // CANCELLATION
    // ==========================================================================

    /// Cancels a confirmed appointment, refunding online payments to the
    /// wallet minus the cancellation fee. Not idempotent.
    #[instrument(skip(self))]
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<CancellationReceipt, BillingError> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut appointment = tx
            .find_appointment(appointment_id)
            .await?
            .ok_or(BillingError::AppointmentNotFound)?;
        match appointment.booking_status {
            BookingStatus::Confirmed => {}
            BookingStatus::Cancelled => return Err(BillingError::AppointmentCancelled),
            BookingStatus::Completed => return Err(BillingError::AppointmentCompleted),
            BookingStatus::Pending => {
                warn!("Rejected cancellation of unconfirmed appointment {}", appointment_id);
                return Err(BillingError::NotConfirmed);
            }
        }

        let mut invoice = tx
            .find_invoice_by_appointment(appointment_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound)?;

        let refund_amount = if invoice.payment_method == PaymentMethod::Online && invoice.is_paid() {
            let refund = self.invoices.refund_for(invoice.total_amount);
            invoice = self.invoices.mark_refunded(tx.as_mut(), invoice, now).await?;
            self.wallets
                .credit(tx.as_mut(), appointment.patient_id, refund, now)
                .await?;
            appointment.payment_status = PaymentStatus::Refunded;
            Some(refund)
        } else {
            None
        };

        appointment.booking_status = BookingStatus::Cancelled;
        appointment.updated_at = now;
        tx.update_appointment(appointment.clone()).await?;
        tx.commit().await?;

        let message = match refund_amount {
            Some(amount) => {
                info!("Appointment {} cancelled, refunded {}", appointment_id, amount);
                format!("Appointment cancelled, {} refunded to wallet", amount)
            }
            None => {
                info!("Appointment {} cancelled without refund", appointment_id);
                "Appointment cancelled".to_string()
            }
        };
        let notification = self
            .notifier
            .dispatch(cancellation_notification(&appointment, refund_amount, now));

        Ok(CancellationReceipt {
            message,
            appointment,
            invoice,
            refund_amount,
            notification,
        })
    }

    // ==========================================================================
    // LOOKUPS AND WALLETS
    // ==========================================================================

    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Invoice, BillingError> {
        let mut tx = self.store.begin().await?;
        let invoice = self.invoices.find(tx.as_mut(), invoice_id).await?;
        tx.rollback().await?;
        Ok(invoice)
    }

    pub async fn payment_records(&self, invoice_id: Uuid) -> Result<Vec<PaymentRecord>, BillingError> {
        let mut tx = self.store.begin().await?;
        let records = tx.payment_records_for_invoice(invoice_id).await?;
        tx.rollback().await?;
        Ok(records)
    }

    pub async fn wallet_balance(&self, patient_id: Uuid) -> Result<Wallet, BillingError> {
        let mut tx = self.store.begin().await?;
        let wallet = tx
            .find_wallet(patient_id)
            .await?
            .ok_or(BillingError::WalletNotFound)?;
        tx.rollback().await?;
        debug!("Wallet of patient {} holds {}", patient_id, wallet.balance);
        Ok(wallet)
    }

    /// Idempotent zero-balance wallet creation for a known patient.
    pub async fn ensure_wallet(&self, patient_id: Uuid) -> Result<Wallet, BillingError> {
        let mut tx = self.store.begin().await?;
        if tx.find_patient(patient_id).await?.is_none() {
            return Err(BillingError::PatientNotFound);
        }
        let wallet = self
            .wallets
            .ensure(tx.as_mut(), patient_id, self.clock.now())
            .await?;
        tx.commit().await?;
        Ok(wallet)
    }
}

/// Amount in minor currency units (paise for INR).
pub fn minor_units(amount: Decimal) -> Result<i64, BillingError> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| BillingError::ValidationError(format!("amount {} out of range", amount)))
}
