//! # Email Notifications
//!
//! Events are rendered into messages and queued on a bounded channel. A pool
//! of worker tasks drains the queue. `notify` never waits: a full queue is
//! reported as [`NotifyError::QueueFull`] and the message is dropped.

use async_trait::async_trait;
use checkout_core::config::EmailConfig;
use checkout_core::{Event, EventType, Observer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::NotifyError;

const FALLBACK_RECIPIENT: &str = "customer@example.com";

/// One rendered message
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    /// Render an event. The recipient comes from the `customer_email`
    /// metadata entry when present.
    pub fn render(event: &Event, from: &str) -> Self {
        let amount = format!("${:.2}", event.amount);
        let (subject, body) = match event.event_type {
            EventType::PaymentStarted => (
                "Payment Processing Started",
                format!(
                    "Your payment of {amount} has been initiated.\nTransaction ID: {}",
                    event.transaction_id
                ),
            ),
            EventType::PaymentSuccess => (
                "Payment Successful",
                format!(
                    "Your payment of {amount} was successful!\nTransaction ID: {}\nPayment Method: {}",
                    event.transaction_id, event.payment_method
                ),
            ),
            EventType::PaymentFailed => (
                "Payment Failed",
                format!(
                    "Your payment of {amount} failed.\nTransaction ID: {}\nReason: {}",
                    event.transaction_id,
                    event.error.as_deref().unwrap_or("unknown error")
                ),
            ),
            EventType::RefundIssued => (
                "Refund Issued",
                format!(
                    "A refund of {amount} has been issued.\nTransaction ID: {}",
                    event.transaction_id
                ),
            ),
        };

        Self {
            from: from.to_string(),
            to: event
                .metadata
                .get("customer_email")
                .cloned()
                .unwrap_or_else(|| FALLBACK_RECIPIENT.to_string()),
            subject: subject.to_string(),
            body,
        }
    }
}

/// Queued email delivery with a fixed worker pool
pub struct EmailNotifier {
    from: String,
    sender: Mutex<Option<mpsc::Sender<EmailMessage>>>,
    // Keeps the channel open when no worker holds the receiver
    _receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<EmailMessage>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    sent: Arc<AtomicU64>,
}

impl EmailNotifier {
    pub const NAME: &'static str = "email_notifier";

    /// Spawn `config.workers` delivery tasks. Must be called inside a Tokio runtime.
    pub fn new(config: &EmailConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_size.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let sent = Arc::new(AtomicU64::new(0));

        let workers = (0..config.workers)
            .map(|id| {
                let rx = Arc::clone(&rx);
                let sent = Arc::clone(&sent);
                tokio::spawn(async move {
                    loop {
                        let next = rx.lock().await.recv().await;
                        let Some(message) = next else { break };
                        deliver(id, &message).await;
                        sent.fetch_add(1, Ordering::Relaxed);
                    }
                    debug!(worker = id, "Email worker stopped");
                })
            })
            .collect();

        if config.workers == 0 {
            warn!("Email notifier has no workers, queued messages will not be delivered");
        }
        info!(
            workers = config.workers,
            queue_size = config.queue_size,
            "Email notifier started"
        );

        Self {
            from: config.from_address.clone(),
            sender: Mutex::new(Some(tx)),
            _receiver: rx,
            workers: Mutex::new(workers),
            sent,
        }
    }

    /// Messages delivered so far
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Close the queue and wait until the workers have drained it
    pub async fn shutdown(&self) {
        let sender = self.sender.lock().map(|mut s| s.take()).unwrap_or(None);
        drop(sender);

        let workers = self
            .workers
            .lock()
            .map(|mut w| std::mem::take(&mut *w))
            .unwrap_or_default();
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "Email worker ended abnormally");
            }
        }
        info!(sent = self.sent_count(), "Email notifier shut down");
    }

    fn sender(&self) -> Option<mpsc::Sender<EmailMessage>> {
        self.sender.lock().ok().and_then(|s| s.clone())
    }
}

async fn deliver(worker: usize, message: &EmailMessage) {
    // No mail transport is wired in; delivery is a log line.
    info!(
        worker,
        from = %message.from,
        to = %message.to,
        subject = %message.subject,
        "Email sent"
    );
}

#[async_trait]
impl Observer for EmailNotifier {
    async fn notify(&self, event: &Event) -> checkout_core::Result<()> {
        let sender = self.sender().ok_or(NotifyError::Closed(Self::NAME))?;
        let message = EmailMessage::render(event, &self.from);

        sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::QueueFull,
            TrySendError::Closed(_) => NotifyError::Closed(Self::NAME),
        })?;
        Ok(())
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(event_type: EventType) -> Event {
        Event::new(event_type, "tx-1", "cust-1", dec!(42.5), "credit_card")
    }

    fn config(workers: usize, queue_size: usize) -> EmailConfig {
        EmailConfig {
            workers,
            queue_size,
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_render_messages() {
        let started = EmailMessage::render(&event(EventType::PaymentStarted), "shop@example.com");
        assert_eq!(started.subject, "Payment Processing Started");
        assert!(started.body.contains("$42.50"));
        assert!(started.body.contains("tx-1"));
        assert_eq!(started.to, FALLBACK_RECIPIENT);

        let failed = EmailMessage::render(
            &event(EventType::PaymentFailed).with_error("card declined"),
            "shop@example.com",
        );
        assert_eq!(failed.subject, "Payment Failed");
        assert!(failed.body.contains("card declined"));
    }

    #[test]
    fn test_recipient_from_metadata() {
        let mut metadata = std::collections::HashMap::new();
        metadata.insert("customer_email".to_string(), "ann@example.com".to_string());
        let message = EmailMessage::render(
            &event(EventType::PaymentSuccess).with_metadata(metadata),
            "shop@example.com",
        );
        assert_eq!(message.to, "ann@example.com");
        assert_eq!(message.subject, "Payment Successful");
    }

    #[tokio::test]
    async fn test_full_queue_rejects_immediately() {
        let notifier = EmailNotifier::new(&config(0, 1));

        notifier.notify(&event(EventType::PaymentStarted)).await.unwrap();
        let err = notifier
            .notify(&event(EventType::PaymentSuccess))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("email queue full"));

        notifier.shutdown().await;
        assert_eq!(notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_workers_drain_queue_on_shutdown() {
        let notifier = EmailNotifier::new(&config(2, 10));
        for _ in 0..5 {
            notifier.notify(&event(EventType::PaymentSuccess)).await.unwrap();
        }

        notifier.shutdown().await;

        assert_eq!(notifier.sent_count(), 5);
        assert!(notifier.notify(&event(EventType::PaymentSuccess)).await.is_err());
    }
}
