use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::{authorize, AmountLimits, Payment, PaymentResult};
use crate::context::CheckoutContext;
use crate::error::{PaymentError, Result};
use crate::money::Currency;
use crate::validator;

/// Wallet instrument backed by an email-identified account. The password is
/// checked for presence and not retained.
#[derive(Debug, Clone)]
pub struct PayPalPayment {
    email: String,
    limits: AmountLimits,
    latency: Duration,
}

impl PayPalPayment {
    pub const TYPE: &'static str = "paypal";

    /// Validate and build a wallet. The password is only checked for presence.
    pub fn new(email: &str, password: &str, limits: AmountLimits) -> Result<Self> {
        validator::validate_email(email)?;
        if password.is_empty() {
            return Err(PaymentError::Validation("paypal password is required".into()));
        }

        Ok(Self {
            email: email.to_string(),
            limits,
            latency: Duration::ZERO,
        })
    }

    /// Builder: simulated gateway latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl Payment for PayPalPayment {
    async fn process(&self, ctx: &CheckoutContext, amount: Decimal) -> Result<PaymentResult> {
        authorize(ctx, &self.limits, self.latency, amount).await?;

        debug!(account = %self.email, %amount, "Charging wallet");
        let mut result = PaymentResult::approved(Self::TYPE, amount, Currency::USD)
            .with_message("paypal payment processed successfully");
        result.insert_meta("paypal_email", self.email.as_str());
        Ok(result)
    }

    fn payment_type(&self) -> &str {
        Self::TYPE
    }

    fn details(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("email".to_string(), self.email.clone())])
    }
}
