//! # checkout-notify
//!
//! Observers for checkout lifecycle events.
//!
//! | Observer | Sink |
//! |----------|------|
//! | [`EmailNotifier`] | bounded queue drained by a worker pool |
//! | [`SmsNotifier`] | short texts, rate limited per rolling minute |
//! | [`WebhookNotifier`] | signed JSON POST with retries |
//! | [`AuditLogger`] | append-only JSON lines file |
//! | [`MetricsCollector`] | in-memory counters with periodic export |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_core::{CheckoutConfig, EventSubject};
//! use checkout_notify::register_observers;
//!
//! let subject = Arc::new(EventSubject::new());
//! let observers = register_observers(&subject, &config).await?;
//!
//! // Serve metrics from observers.metrics.snapshot()
//! // On shutdown:
//! observers.shutdown().await;
//! ```

pub mod audit;
pub mod email;
pub mod error;
pub mod metrics;
pub mod sms;
pub mod webhook;

pub use audit::{AuditEntry, AuditLogger};
pub use email::{EmailMessage, EmailNotifier};
pub use error::{NotifyError, Result};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use sms::SmsNotifier;
pub use webhook::WebhookNotifier;

use checkout_core::{CheckoutConfig, EventSubject};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Handles to the observers that need attention after registration
pub struct RegisteredObservers {
    pub metrics: Arc<MetricsCollector>,
    pub email: Option<Arc<EmailNotifier>>,
    exporter: JoinHandle<()>,
}

impl RegisteredObservers {
    /// Stop the metrics exporter and drain the email queue
    pub async fn shutdown(self) {
        self.exporter.abort();
        if let Some(email) = self.email {
            email.shutdown().await;
        }
    }
}

/// Attach every observer enabled in `config` to `subject`.
///
/// Metrics are always collected. A webhook without a URL is skipped.
pub async fn register_observers(
    subject: &EventSubject,
    config: &CheckoutConfig,
) -> Result<RegisteredObservers> {
    let notifications = &config.notifications;

    let metrics = Arc::new(MetricsCollector::new());
    subject.attach(metrics.clone());
    let exporter =
        metrics.spawn_exporter(Duration::from_secs(config.metrics.export_interval_secs));

    let email = if notifications.email.enabled {
        let email = Arc::new(EmailNotifier::new(&notifications.email));
        subject.attach(email.clone());
        Some(email)
    } else {
        None
    };

    if notifications.sms.enabled {
        subject.attach(Arc::new(SmsNotifier::new(&notifications.sms)));
    }

    if notifications.audit.enabled {
        subject.attach(Arc::new(AuditLogger::from_config(&notifications.audit).await?));
    }

    if notifications.webhook.enabled {
        if notifications.webhook.url.is_empty() {
            warn!("Webhook notifications enabled without a URL, skipping");
        } else {
            subject.attach(Arc::new(WebhookNotifier::new(&notifications.webhook)?));
        }
    }

    info!(observers = subject.observer_count(), "Observers registered");
    Ok(RegisteredObservers {
        metrics,
        email,
        exporter,
    })
}
