//! # Checkout Events
//!
//! The facade emits an [`Event`] for every lifecycle transition. An
//! [`EventSubject`] fans each event out to its [`Observer`]s, one task per
//! observer. A failing or panicking observer is logged and never affects its
//! siblings or the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::payment::PaymentResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PaymentStarted,
    PaymentSuccess,
    PaymentFailed,
    RefundIssued,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PaymentStarted => "payment_started",
            EventType::PaymentSuccess => "payment_success",
            EventType::PaymentFailed => "payment_failed",
            EventType::RefundIssued => "refund_issued",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub transaction_id: String,
    pub customer_id: String,
    pub amount: Decimal,
    pub payment_method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PaymentResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        event_type: EventType,
        transaction_id: impl Into<String>,
        customer_id: impl Into<String>,
        amount: Decimal,
        payment_method: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            transaction_id: transaction_id.into(),
            customer_id: customer_id.into(),
            amount,
            payment_method: payment_method.into(),
            result: None,
            error: None,
            metadata: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Builder: attach the payment result
    pub fn with_result(mut self, result: PaymentResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Builder: attach the failure text
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Receives checkout events
#[async_trait]
pub trait Observer: Send + Sync {
    async fn notify(&self, event: &Event) -> Result<()>;

    /// Unique name, used by [`EventSubject::detach`]
    fn name(&self) -> &str;
}

/// Fan-out point for events
#[derive(Default)]
pub struct EventSubject {
    observers: RwLock<Vec<Arc<dyn Observer>>>,
}

impl EventSubject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, observer: Arc<dyn Observer>) {
        debug!(observer = observer.name(), "Observer attached");
        self.write().push(observer);
    }

    /// Remove every observer called `name`; returns whether any was removed
    pub fn detach(&self, name: &str) -> bool {
        let mut observers = self.write();
        let before = observers.len();
        observers.retain(|o| o.name() != name);
        before != observers.len()
    }

    pub fn observer_count(&self) -> usize {
        self.snapshot().len()
    }

    /// Deliver `event` to every observer concurrently and wait for all of them
    pub async fn notify(&self, event: Arc<Event>) {
        let observers = self.snapshot();
        let handles: Vec<_> = observers
            .into_iter()
            .map(|observer| {
                let event = Arc::clone(&event);
                let name = observer.name().to_string();
                let handle = tokio::spawn(async move { observer.notify(&event).await });
                (name, handle)
            })
            .collect();

        for (name, handle) in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    observer = %name,
                    event_type = %event.event_type,
                    error = %e,
                    "Observer failed"
                ),
                Err(e) => error!(observer = %name, error = %e, "Observer task panicked"),
            }
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn Observer>> {
        match self.observers.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<dyn Observer>>> {
        match self.observers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for EventSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubject")
            .field("observers", &self.observer_count())
            .finish()
    }
}
