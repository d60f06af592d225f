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

/// Card instrument. The number is stored normalized (digits only); the CVV is
/// checked at construction and never retained.
#[derive(Debug, Clone)]
pub struct CreditCardPayment {
    card_number: String,
    card_holder: String,
    expiry_date: String,
    limits: AmountLimits,
    latency: Duration,
}

impl CreditCardPayment {
    pub const TYPE: &'static str = "credit_card";

    /// Validate and build a card. Fails on bad number, CVV, expiry or empty holder.
    pub fn new(
        card_number: &str,
        card_holder: &str,
        expiry_date: &str,
        cvv: &str,
        limits: AmountLimits,
    ) -> Result<Self> {
        let card_number = validator::validate_card_number(card_number)?;
        validator::validate_cvv(cvv)?;
        validator::validate_expiry(expiry_date)?;
        if card_holder.trim().is_empty() {
            return Err(PaymentError::Validation("card holder name is required".into()));
        }

        Ok(Self {
            card_number,
            card_holder: card_holder.trim().to_string(),
            expiry_date: expiry_date.to_string(),
            limits,
            latency: Duration::ZERO,
        })
    }

    /// Builder: simulated gateway latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn last_four(&self) -> &str {
        &self.card_number[self.card_number.len() - 4..]
    }

    pub fn masked_number(&self) -> String {
        format!("****{}", self.last_four())
    }
}

#[async_trait]
impl Payment for CreditCardPayment {
    async fn process(&self, ctx: &CheckoutContext, amount: Decimal) -> Result<PaymentResult> {
        authorize(ctx, &self.limits, self.latency, amount).await?;

        debug!(card = %self.masked_number(), %amount, "Charging card");
        let mut result = PaymentResult::approved(Self::TYPE, amount, Currency::USD)
            .with_message("credit card payment processed successfully");
        result.insert_meta("card_last_four", self.last_four());
        result.insert_meta("card_holder", self.card_holder.as_str());
        Ok(result)
    }

    fn payment_type(&self) -> &str {
        Self::TYPE
    }

    fn details(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("card_number".to_string(), self.masked_number()),
            ("card_holder".to_string(), self.card_holder.clone()),
            ("expiry_date".to_string(), self.expiry_date.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    fn limits() -> AmountLimits {
        AmountLimits::new(dec!(1), dec!(10000))
    }

    fn card() -> CreditCardPayment {
        CreditCardPayment::new("4532 0151 1283 0366", "John Doe", "12/30", "123", limits()).unwrap()
    }

    #[tokio::test]
    async fn test_process_echoes_amount() {
        let result = card().process(&CheckoutContext::new(), dec!(250.00)).await.unwrap();

        assert!(result.success);
        assert_eq!(result.payment_method, "credit_card");
        assert_eq!(result.original_amount, dec!(250.00));
        assert_eq!(result.processed_amount, dec!(250.00));
        assert_eq!(result.amount, dec!(250.00));
        assert_eq!(result.metadata["card_last_four"], "0366");
    }

    #[tokio::test]
    async fn test_unique_transaction_ids() {
        let card = card();
        let ctx = CheckoutContext::new();
        let a = card.process(&ctx, dec!(5)).await.unwrap();
        let b = card.process(&ctx, dec!(5)).await.unwrap();
        assert_ne!(a.transaction_id, b.transaction_id);
    }

    #[tokio::test]
    async fn test_amount_out_of_range() {
        let err = card().process(&CheckoutContext::new(), dec!(10000.01)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let ctx = CheckoutContext::new();
        ctx.cancel();
        let err = card().process(&ctx, dec!(10)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_construction_validates() {
        assert!(CreditCardPayment::new("4532015112830367", "J", "12/30", "123", limits()).is_err());
        assert!(CreditCardPayment::new("4532015112830366", " ", "12/30", "123", limits()).is_err());
        assert!(CreditCardPayment::new("4532015112830366", "J", "13/30", "123", limits()).is_err());
        assert!(CreditCardPayment::new("4532015112830366", "J", "12/30", "12", limits()).is_err());
    }

    #[test]
    fn test_details_are_masked() {
        let details = card().details();
        assert_eq!(details["card_number"], "****0366");
        assert!(details.values().all(|v| !v.contains("4532")));
    }
}
