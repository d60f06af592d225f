//! # SMS Notifications
//!
//! Short texts with a rolling one-minute send limit.

use async_trait::async_trait;
use checkout_core::config::SmsConfig;
use checkout_core::{Event, EventType, Observer};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::error::NotifyError;

const WINDOW: Duration = Duration::from_secs(60);

pub struct SmsNotifier {
    rate_limit: usize,
    sent: Mutex<VecDeque<Instant>>,
}

impl SmsNotifier {
    pub const NAME: &'static str = "sms_notifier";

    pub fn new(config: &SmsConfig) -> Self {
        Self {
            rate_limit: config.rate_limit,
            sent: Mutex::new(VecDeque::new()),
        }
    }

    /// Render the text for an event
    pub fn render(event: &Event) -> String {
        let tx: String = event.transaction_id.chars().take(8).collect();
        match event.event_type {
            EventType::PaymentStarted => {
                format!("Payment of ${:.2} is being processed. TX: {tx}", event.amount)
            }
            EventType::PaymentSuccess => {
                format!("Payment of ${:.2} successful! TX: {tx}", event.amount)
            }
            EventType::PaymentFailed => {
                format!("Payment of ${:.2} failed. TX: {tx}. Please try again.", event.amount)
            }
            EventType::RefundIssued => {
                format!("Refund of ${:.2} issued. TX: {tx}", event.amount)
            }
        }
    }

    /// Claim a send slot in the current window
    fn acquire(&self) -> Result<(), NotifyError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| NotifyError::Closed(Self::NAME))?;
        let now = Instant::now();
        while sent.front().is_some_and(|t| now.duration_since(*t) >= WINDOW) {
            sent.pop_front();
        }
        if sent.len() >= self.rate_limit {
            return Err(NotifyError::RateLimited(self.rate_limit));
        }
        sent.push_back(now);
        Ok(())
    }
}

#[async_trait]
impl Observer for SmsNotifier {
    async fn notify(&self, event: &Event) -> checkout_core::Result<()> {
        self.acquire()?;
        let to = event.metadata.get("customer_phone").map(String::as_str).unwrap_or("unknown");
        info!(customer_id = %event.customer_id, to, text = %Self::render(event), "SMS sent");
        Ok(())
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
