use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    InvoiceDue,
    InvoicePaid,
    AppointmentCancelled,
}

/// A message for one patient, rendered before it is queued.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub invoice_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// What the caller of a financial operation is told about its notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Queued,
    Failed(String),
}

impl NotificationOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, NotificationOutcome::Queued)
    }
}
