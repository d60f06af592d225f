//! # Checkout Metrics
//!
//! Lock-free counters fed by checkout events, with a periodic log export.

use async_trait::async_trait;
use checkout_core::money::to_cents;
use checkout_core::{Event, EventType, Observer};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Point-in-time view of the counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub success_count: u64,
    pub failure_count: u64,
    pub total_payments: u64,
    /// Percentage of finished payments that succeeded
    pub success_rate: f64,
    pub total_amount: Decimal,
    pub average_amount: Decimal,
    pub payment_method_counts: BTreeMap<String, u64>,
}

#[derive(Debug, Default)]
pub struct MetricsCollector {
    success: AtomicU64,
    failure: AtomicU64,
    /// Net processed amount in cents; refunds subtract
    total_cents: AtomicI64,
    by_method: Mutex<HashMap<String, u64>>,
}

impl MetricsCollector {
    pub const NAME: &'static str = "metrics_collector";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let success_count = self.success.load(Ordering::Relaxed);
        let failure_count = self.failure.load(Ordering::Relaxed);
        let total_payments = success_count + failure_count;
        let total_amount = Decimal::new(self.total_cents.load(Ordering::Relaxed), 2);

        let success_rate = if total_payments == 0 {
            0.0
        } else {
            success_count as f64 / total_payments as f64 * 100.0
        };
        let average_amount = if success_count == 0 {
            Decimal::ZERO
        } else {
            (total_amount / Decimal::from(success_count)).round_dp(2)
        };

        let payment_method_counts = self
            .by_method
            .lock()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();

        MetricsSnapshot {
            success_count,
            failure_count,
            total_payments,
            success_rate,
            total_amount,
            average_amount,
            payment_method_counts,
        }
    }

    pub fn reset(&self) {
        self.success.store(0, Ordering::Relaxed);
        self.failure.store(0, Ordering::Relaxed);
        self.total_cents.store(0, Ordering::Relaxed);
        if let Ok(mut by_method) = self.by_method.lock() {
            by_method.clear();
        }
    }

    /// Log a snapshot every `interval` until the handle is aborted
    pub fn spawn_exporter(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let metrics = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let s = metrics.snapshot();
                info!(
                    success = s.success_count,
                    failure = s.failure_count,
                    success_rate = %format!("{:.2}", s.success_rate),
                    total_amount = %s.total_amount,
                    average_amount = %s.average_amount,
                    "Payment metrics"
                );
            }
        })
    }

    fn count_method(&self, method: &str) {
        if let Ok(mut by_method) = self.by_method.lock() {
            *by_method.entry(method.to_string()).or_default() += 1;
        }
    }
}

#[async_trait]
impl Observer for MetricsCollector {
    async fn notify(&self, event: &Event) -> checkout_core::Result<()> {
        match event.event_type {
            EventType::PaymentSuccess => {
                self.success.fetch_add(1, Ordering::Relaxed);
                self.total_cents.fetch_add(to_cents(event.amount), Ordering::Relaxed);
                self.count_method(&event.payment_method);
            }
            EventType::PaymentFailed => {
                self.failure.fetch_add(1, Ordering::Relaxed);
            }
            EventType::RefundIssued => {
                self.total_cents.fetch_sub(to_cents(event.amount), Ordering::Relaxed);
            }
            EventType::PaymentStarted => {}
        }
        Ok(())
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
