use std::env;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub slot_duration_minutes: i64,
    pub booking_surcharge: Decimal,
    pub cancellation_refund_rate: Decimal,
    pub invoice_due_days: i64,
    pub gateway_base_url: String,
    pub gateway_key_id: String,
    pub gateway_key_secret: String,
    pub gateway_currency: String,
    pub notification_webhook_url: Option<String>,
    pub notification_max_attempts: u32,
    /// JSON file of doctors and patients loaded into the store at startup.
    pub directory_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3000,
            slot_duration_minutes: 30,
            booking_surcharge: dec!(50),
            cancellation_refund_rate: dec!(0.95),
            invoice_due_days: 1,
            gateway_base_url: "https://api.razorpay.com".to_string(),
            gateway_key_id: String::new(),
            gateway_key_secret: String::new(),
            gateway_currency: "INR".to_string(),
            notification_webhook_url: None,
            notification_max_attempts: 3,
            directory_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            slot_duration_minutes: parse_var("SLOT_DURATION_MINUTES", defaults.slot_duration_minutes),
            booking_surcharge: parse_var("BOOKING_SURCHARGE", defaults.booking_surcharge),
            cancellation_refund_rate: parse_var(
                "CANCELLATION_REFUND_RATE",
                defaults.cancellation_refund_rate,
            ),
            invoice_due_days: parse_var("INVOICE_DUE_DAYS", defaults.invoice_due_days),
            gateway_base_url: env::var("PAYMENT_GATEWAY_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("PAYMENT_GATEWAY_BASE_URL not set, using default");
                    defaults.gateway_base_url.clone()
                }),
            gateway_key_id: env::var("PAYMENT_GATEWAY_KEY_ID")
                .unwrap_or_else(|_| {
                    warn!("PAYMENT_GATEWAY_KEY_ID not set, using empty value");
                    String::new()
                }),
            gateway_key_secret: env::var("PAYMENT_GATEWAY_KEY_SECRET")
                .unwrap_or_else(|_| {
                    warn!("PAYMENT_GATEWAY_KEY_SECRET not set, using empty value");
                    String::new()
                }),
            gateway_currency: env::var("PAYMENT_GATEWAY_CURRENCY")
                .unwrap_or_else(|_| defaults.gateway_currency.clone()),
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL").ok(),
            directory_path: env::var("CLINIC_DIRECTORY_PATH").ok(),
            notification_max_attempts: parse_var(
                "NOTIFICATION_MAX_ATTEMPTS",
                defaults.notification_max_attempts,
            ),
        };

        if !config.is_gateway_configured() {
            warn!("Payment gateway not configured - online settlement will be unavailable");
        }
        if config.notification_webhook_url.is_none() {
            warn!("NOTIFICATION_WEBHOOK_URL not set, notifications will only be logged");
        }
        if config.directory_path.is_none() {
            warn!("CLINIC_DIRECTORY_PATH not set, starting with no doctors or patients");
        }

        config
    }

    pub fn is_gateway_configured(&self) -> bool {
        !self.gateway_base_url.is_empty()
            && !self.gateway_key_id.is_empty()
            && !self.gateway_key_secret.is_empty()
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
