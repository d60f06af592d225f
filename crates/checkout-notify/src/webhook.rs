//! # Webhook Delivery
//!
//! POSTs each event as JSON to a configured endpoint. Failed deliveries are
//! retried with a linear backoff (attempt × base delay). When a secret is
//! configured the body is signed with HMAC-SHA256 and the hex digest is sent
//! as `X-Checkout-Signature: sha256=<digest>`.
//!
//! Receivers can check a delivery with [`verify_signature`]:
//!
//! ```rust,ignore
//! use checkout_notify::webhook::verify_signature;
//!
//! let signature = headers["X-Checkout-Signature"].to_str()?;
//! if !verify_signature(&secret, &body, signature) {
//!     return Err(StatusCode::UNAUTHORIZED);
//! }
//! ```

use async_trait::async_trait;
use checkout_core::config::WebhookConfig;
use checkout_core::{Event, Observer};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{NotifyError, Result};

pub const SIGNATURE_HEADER: &str = "X-Checkout-Signature";
pub const EVENT_HEADER: &str = "X-Checkout-Event";
const USER_AGENT: &str = concat!("checkout-engine/", env!("CARGO_PKG_VERSION"));

pub struct WebhookNotifier {
    client: Client,
    url: String,
    max_attempts: u32,
    backoff: Duration,
    secret: Option<String>,
}

impl WebhookNotifier {
    pub const NAME: &'static str = "webhook_notifier";

    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            max_attempts: config.max_retries.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
            secret: config.secret.clone().filter(|s| !s.is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, event: &Event, body: &[u8], signature: Option<&str>) -> Result<()> {
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(EVENT_HEADER, event.event_type.as_str())
            .body(body.to_vec());
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Delivery {
                attempts: 1,
                reason: format!("endpoint returned {status}"),
            })
        }
    }

    #[instrument(skip(self, event), fields(event_type = %event.event_type, transaction_id = %event.transaction_id))]
    async fn deliver(&self, event: &Event) -> Result<()> {
        let body = serde_json::to_vec(event)?;
        let signature = match &self.secret {
            Some(secret) => Some(format!("sha256={}", compute_hmac_sha256(secret, &body)?)),
            None => None,
        };

        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.backoff * (attempt - 1)).await;
            }
            match self.post(event, &body, signature.as_deref()).await {
                Ok(()) => {
                    info!(attempt, url = %self.url, "Webhook delivered");
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Webhook attempt failed");
                    last_error = match e {
                        NotifyError::Delivery { reason, .. } => reason,
                        other => other.to_string(),
                    };
                }
            }
        }

        Err(NotifyError::Delivery {
            attempts: self.max_attempts,
            reason: last_error,
        })
    }
}

#[async_trait]
impl Observer for WebhookNotifier {
    async fn notify(&self, event: &Event) -> checkout_core::Result<()> {
        self.deliver(event).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Hex HMAC-SHA256 of `message`
pub fn compute_hmac_sha256(secret: &str, message: &[u8]) -> Result<String> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| NotifyError::Signing(e.to_string()))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a `sha256=<hex>` signature header against `body`
pub fn verify_signature(secret: &str, body: &[u8], header: &str) -> bool {
    let Some(received) = header.strip_prefix("sha256=") else {
        debug!("Signature header missing sha256= prefix");
        return false;
    };
    match compute_hmac_sha256(secret, body) {
        Ok(expected) => constant_time_compare(&expected, received),
        Err(_) => false,
    }
}

/// Constant-time string comparison
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
