use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use shared_database::{StoreTransaction, WalletRepository};
use shared_models::Wallet;

use crate::models::BillingError;

/// Per-patient balance operations, applied inside the caller's transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalletLedger;

impl WalletLedger {
    pub async fn ensure(
        &self,
        tx: &mut dyn StoreTransaction,
        patient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Wallet, BillingError> {
        if let Some(wallet) = tx.find_wallet(patient_id).await? {
            return Ok(wallet);
        }

        let wallet = Wallet {
            patient_id,
            balance: Decimal::ZERO,
            updated_at: now,
        };
        tx.save_wallet(wallet.clone()).await?;
        info!("Created wallet for patient {}", patient_id);
        Ok(wallet)
    }

    pub async fn credit(
        &self,
        tx: &mut dyn StoreTransaction,
        patient_id: Uuid,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Wallet, BillingError> {
        if amount < Decimal::ZERO {
            return Err(BillingError::ValidationError(
                "credit amount must not be negative".to_string(),
            ));
        }

        let mut wallet = self.ensure(tx, patient_id, now).await?;
        wallet.balance += amount;
        wallet.updated_at = now;
        tx.save_wallet(wallet.clone()).await?;

        info!("Credited {} to wallet of patient {}", amount, patient_id);
        Ok(wallet)
    }

    /// Fails without touching the balance when it would go negative.
    pub async fn debit(
        &self,
        tx: &mut dyn StoreTransaction,
        patient_id: Uuid,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Wallet, BillingError> {
        let mut wallet = tx
            .find_wallet(patient_id)
            .await?
            .ok_or(BillingError::WalletNotFound)?;

        if wallet.balance < amount {
            warn!(
                "Wallet of patient {} holds {}, {} required",
                patient_id, wallet.balance, amount
            );
            return Err(BillingError::InsufficientFunds {
                balance: wallet.balance,
                required: amount,
            });
        }

        wallet.balance -= amount;
        wallet.updated_at = now;
        tx.save_wallet(wallet.clone()).await?;

        info!("Debited {} from wallet of patient {}", amount, patient_id);
        Ok(wallet)
    }
}
