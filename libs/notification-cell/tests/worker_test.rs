use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;
use mockall::{mock, Sequence};
use tokio::time::{timeout, Duration};
use uuid::Uuid;

use notification_cell::*;
use shared_utils::test_utils::TestConfig;

mock! {
    pub Sender {}

    #[async_trait]
    impl NotificationSender for Sender {
        async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
    }
}

fn notification() -> Notification {
    Notification {
        id: Uuid::new_v4(),
        kind: NotificationKind::InvoicePaid,
        recipient: "patient@clinic.test".to_string(),
        subject: "Payment confirmation".to_string(),
        body: "paid".to_string(),
        invoice_id: Some(Uuid::new_v4()),
        created_at: Utc::now(),
    }
}

fn worker(sender: MockSender) -> (NotificationQueue, NotificationWorker) {
    let config = TestConfig::default().to_app_config();
    let (queue, receiver) = NotificationQueue::new(8);
    let worker = NotificationWorker::new(receiver, Arc::new(sender), &config)
        .with_backoff(Duration::from_millis(1));
    (queue, worker)
}

#[tokio::test]
async fn test_retries_until_delivery_succeeds() {
    let mut sender = MockSender::new();
    let mut seq = Sequence::new();
    sender
        .expect_send()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(NotificationError::Rejected { status: 503 }));
    sender
        .expect_send()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let (_queue, worker) = worker(sender);
    assert_eq!(worker.deliver(&notification()).await, Ok(2));
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let mut sender = MockSender::new();
    // Test config allows two attempts.
    sender
        .expect_send()
        .times(2)
        .returning(|_| Err(NotificationError::Delivery("connection refused".to_string())));

    let (_queue, worker) = worker(sender);
    assert_matches!(
        worker.deliver(&notification()).await,
        Err(NotificationError::MaxAttemptsExceeded { max_attempts: 2, .. })
    );
}

#[tokio::test]
async fn test_run_drains_queue_and_stops_when_closed() {
    let mut sender = MockSender::new();
    sender.expect_send().times(3).returning(|_| Ok(()));

    let (queue, worker) = worker(sender);
    for _ in 0..3 {
        queue.enqueue(notification()).expect("enqueue");
    }
    drop(queue);

    timeout(Duration::from_secs(5), worker.run())
        .await
        .expect("worker stops once the queue is closed");
}

#[tokio::test]
async fn test_spawned_notifier_delivers_queued_messages() {
    let config = TestConfig::default().to_app_config();
    let (queue, handle) = spawn_notifier(&config, Arc::new(LogSender));

    assert!(queue.dispatch(notification()).is_queued());
    drop(queue);

    timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker finished")
        .expect("worker did not panic");
}
