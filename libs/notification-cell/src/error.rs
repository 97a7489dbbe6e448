use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotificationError {
    #[error("Notification queue is closed")]
    QueueClosed,

    #[error("Notification queue is full")]
    QueueFull,

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Webhook rejected notification with status {status}")]
    Rejected { status: u16 },

    #[error("Maximum delivery attempts ({max_attempts}) exceeded for notification {notification_id}")]
    MaxAttemptsExceeded {
        notification_id: String,
        max_attempts: u32,
    },
}
