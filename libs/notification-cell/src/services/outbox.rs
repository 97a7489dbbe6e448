use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::error::NotificationError;
use crate::models::{Notification, NotificationOutcome};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Producer side of the notification outbox. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<Notification>,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Queue without waiting. Fails when the worker is gone or backed up.
    pub fn enqueue(&self, notification: Notification) -> Result<(), NotificationError> {
        let id = notification.id;
        self.sender.try_send(notification).map_err(|e| match e {
            TrySendError::Full(_) => NotificationError::QueueFull,
            TrySendError::Closed(_) => NotificationError::QueueClosed,
        })?;
        debug!("Queued notification {}", id);
        Ok(())
    }

    /// Queue and fold the result into what the caller reports.
    pub fn dispatch(&self, notification: Notification) -> NotificationOutcome {
        match self.enqueue(notification) {
            Ok(()) => NotificationOutcome::Queued,
            Err(e) => {
                warn!("Notification not queued: {}", e);
                NotificationOutcome::Failed(e.to_string())
            }
        }
    }
}
