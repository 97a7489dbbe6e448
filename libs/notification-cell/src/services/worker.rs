use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;

use crate::error::NotificationError;
use crate::models::Notification;
use crate::services::outbox::{NotificationQueue, DEFAULT_QUEUE_CAPACITY};
use crate::services::sender::NotificationSender;

const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Drains the outbox, retrying each delivery with exponential backoff.
pub struct NotificationWorker {
    receiver: mpsc::Receiver<Notification>,
    sender: Arc<dyn NotificationSender>,
    max_attempts: u32,
    backoff: Duration,
}

impl NotificationWorker {
    pub fn new(
        receiver: mpsc::Receiver<Notification>,
        sender: Arc<dyn NotificationSender>,
        config: &AppConfig,
    ) -> Self {
        Self {
            receiver,
            sender,
            max_attempts: config.notification_max_attempts.max(1),
            backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Runs until every queue handle is dropped.
    pub async fn run(mut self) {
        info!("Notification worker started");

        while let Some(notification) = self.receiver.recv().await {
            if let Err(e) = self.deliver(&notification).await {
                error!("Dropping notification {}: {}", notification.id, e);
            }
        }

        info!("Notification queue closed, worker stopping");
    }

    /// Returns the number of attempts used on success.
    #[instrument(skip(self, notification), fields(notification_id = %notification.id))]
    pub async fn deliver(&self, notification: &Notification) -> Result<u32, NotificationError> {
        let mut attempt = 1;
        loop {
            match self.sender.send(notification).await {
                Ok(()) => {
                    debug!("Delivered on attempt {}", attempt);
                    return Ok(attempt);
                }
                Err(e) if attempt < self.max_attempts => {
                    let delay = self.backoff * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        "Attempt {}/{} failed: {}; retrying in {:?}",
                        attempt, self.max_attempts, e, delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("Final attempt failed: {}", e);
                    return Err(NotificationError::MaxAttemptsExceeded {
                        notification_id: notification.id.to_string(),
                        max_attempts: self.max_attempts,
                    });
                }
            }
        }
    }
}

/// Builds the outbox and spawns its worker on the current runtime.
pub fn spawn_notifier(
    config: &AppConfig,
    sender: Arc<dyn NotificationSender>,
) -> (NotificationQueue, JoinHandle<()>) {
    let (queue, receiver) = NotificationQueue::new(DEFAULT_QUEUE_CAPACITY);
    let worker = NotificationWorker::new(receiver, sender, config);
    let handle = tokio::spawn(worker.run());
    (queue, handle)
}
