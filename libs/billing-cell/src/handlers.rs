use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{GatewayCallback, SettlementReceipt, WalletBalance};
use crate::services::PaymentSettlement;

fn settlement_body(receipt: SettlementReceipt) -> Json<Value> {
    Json(json!({
        "invoice": receipt.invoice,
        "appointment": receipt.appointment,
        "wallet": receipt.wallet.map(WalletBalance::from),
        "notification": receipt.notification,
    }))
}

// ==============================================================================
// INVOICE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_invoice(
    State(settlement): State<Arc<PaymentSettlement>>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let invoice = settlement.get_invoice(invoice_id).await?;
    let payments = settlement.payment_records(invoice_id).await?;

    Ok(Json(json!({
        "invoice": invoice,
        "payments": payments
    })))
}

#[axum::debug_handler]
pub async fn settle_offline(
    State(settlement): State<Arc<PaymentSettlement>>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let receipt = settlement.settle_offline(invoice_id).await?;
    Ok(settlement_body(receipt))
}

#[axum::debug_handler]
pub async fn settle_wallet(
    State(settlement): State<Arc<PaymentSettlement>>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let receipt = settlement.settle_wallet(invoice_id).await?;
    Ok(settlement_body(receipt))
}

// ==============================================================================
// GATEWAY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_online_order(
    State(settlement): State<Arc<PaymentSettlement>>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let online = settlement.create_online_order(invoice_id).await?;

    Ok(Json(json!({
        "order_ref": online.order.order_ref,
        "invoice_id": online.order.invoice_id,
        "amount": online.order.amount_minor,
        "currency": online.order.currency,
        "key_id": online.key_id
    })))
}

#[axum::debug_handler]
pub async fn gateway_callback(
    State(settlement): State<Arc<PaymentSettlement>>,
    Json(callback): Json<GatewayCallback>,
) -> Result<Json<Value>, AppError> {
    let receipt = settlement.settle_online(callback).await?;
    Ok(settlement_body(receipt))
}

// ==============================================================================
// WALLET AND CANCELLATION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_wallet(
    State(settlement): State<Arc<PaymentSettlement>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let wallet = settlement.wallet_balance(patient_id).await?;
    Ok(Json(json!(WalletBalance::from(wallet))))
}

#[axum::debug_handler]
pub async fn ensure_wallet(
    State(settlement): State<Arc<PaymentSettlement>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let wallet = settlement.ensure_wallet(patient_id).await?;
    Ok(Json(json!(WalletBalance::from(wallet))))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(settlement): State<Arc<PaymentSettlement>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let receipt = settlement.cancel_appointment(appointment_id).await?;

    Ok(Json(json!({
        "message": receipt.message,
        "refund_amount": receipt.refund_amount,
        "appointment": receipt.appointment,
        "invoice": receipt.invoice,
        "notification": receipt.notification
    })))
}
