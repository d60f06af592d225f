//! # Checkout Context
//!
//! Deadline and cancellation carried through one checkout call. Payments check
//! it before charging; the orchestrator derives one child context from the
//! configured payment timeout and shares it across retry attempts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{PaymentError, Result};

#[derive(Debug, Clone, Default)]
pub struct CheckoutContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl CheckoutContext {
    /// A context with no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// A context expiring `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancelled: Arc::default(),
        }
    }

    /// Derive a context sharing this one's cancellation, with the earlier of both deadlines
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Cancel this context and every context derived from it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with a timeout error once cancelled or past the deadline
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(PaymentError::Timeout("context cancelled".into()));
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(PaymentError::Timeout("context deadline exceeded".into()));
        }
        Ok(())
    }

    /// Sleep for `duration`, failing early if the deadline arrives first
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        match self.remaining() {
            Some(left) if left < duration => {
                tokio::time::sleep(left).await;
                Err(PaymentError::Timeout("context deadline exceeded".into()))
            }
            _ => {
                tokio::time::sleep(duration).await;
                self.check()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_cancel_propagates_to_child() {
        let parent = CheckoutContext::new();
        let child = parent.child_with_timeout(Duration::from_secs(30));
        assert!(child.check().is_ok());

        parent.cancel();
        assert!(child.is_done());
        assert_eq!(child.check().unwrap_err().kind(), ErrorKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let ctx = CheckoutContext::with_timeout(Duration::from_millis(50));
        let err = ctx.sleep(Duration::from_millis(200)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(ctx.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_keeps_earlier_deadline() {
        let parent = CheckoutContext::with_timeout(Duration::from_millis(10));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }
}
