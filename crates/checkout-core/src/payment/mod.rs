//! # Payment Capability
//!
//! A [`Payment`] is something that can be charged: a card, a wallet account or
//! a crypto address. Decorators and strategies are built on top of this one
//! trait.
//!
//! ```text
//! ┌───────────────────────┐
//! │   Payment (trait)     │
//! │  process(ctx, amount) │
//! │  payment_type()       │
//! │  details()            │
//! └──────────┬────────────┘
//!            │
//!   ┌────────┼─────────┬──────────────┐
//!   ▼        ▼         ▼              ▼
//! CreditCard PayPal  Crypto     Decorated { feature, inner }
//! ```
//!
//! Instruments validate their fields at construction and never hold invalid
//! data. `process` only re-checks the context and the amount range.

mod credit_card;
mod crypto;
mod paypal;

pub use credit_card::CreditCardPayment;
pub use crypto::{CryptoPayment, CryptoType};
pub use paypal::PayPalPayment;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::context::CheckoutContext;
use crate::error::{PaymentError, Result};
use crate::money::Currency;

/// Key/value facts attached to a result by instruments, decorators and strategies
pub type Metadata = BTreeMap<String, Value>;

/// Outcome of a successful charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub success: bool,

    /// Opaque unique identifier synthesized per charge
    pub transaction_id: String,

    /// Final amount (equal to `processed_amount` unless a strategy narrows it)
    pub amount: Decimal,

    /// Caller-facing amount before decoration
    pub original_amount: Decimal,

    /// Amount actually charged after decoration
    pub processed_amount: Decimal,

    pub currency: Currency,

    /// Instrument tag (`credit_card`, `paypal`, `crypto`, `split`)
    pub payment_method: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub metadata: Metadata,

    /// Decorator names in unwind order (innermost first)
    #[serde(default)]
    pub applied_decorators: Vec<String>,
}

impl PaymentResult {
    /// A successful charge of `amount` with a fresh transaction id
    pub fn approved(payment_method: impl Into<String>, amount: Decimal, currency: Currency) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("processed_at".into(), Value::String(Utc::now().to_rfc3339()));
        Self {
            success: true,
            transaction_id: Uuid::new_v4().to_string(),
            amount,
            original_amount: amount,
            processed_amount: amount,
            currency,
            payment_method: payment_method.into(),
            message: String::new(),
            metadata,
            applied_decorators: Vec::new(),
        }
    }

    /// Builder: set message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn insert_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Read a money fact written with [`money_value`]
    pub fn meta_decimal(&self, key: &str) -> Option<Decimal> {
        match self.metadata.get(key)? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.to_string().parse().ok(),
            _ => None,
        }
    }

    pub fn meta_u64(&self, key: &str) -> Option<u64> {
        self.metadata.get(key).and_then(Value::as_u64)
    }

    pub fn has_decorator(&self, name: &str) -> bool {
        self.applied_decorators.iter().any(|d| d == name)
    }
}

/// Money facts are stored as two-decimal strings so they round-trip exactly
pub fn money_value(amount: Decimal) -> Value {
    Value::String(format!("{:.2}", crate::money::round_money(amount)))
}

/// Inclusive amount bounds for an instrument or strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountLimits {
    pub min: Decimal,
    pub max: Decimal,
}

impl AmountLimits {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && amount <= self.max
    }

    pub fn check(&self, amount: Decimal) -> Result<()> {
        if self.contains(amount) {
            Ok(())
        } else {
            Err(PaymentError::Validation(format!(
                "amount {amount} must be between {} and {}",
                self.min, self.max
            )))
        }
    }
}

/// A chargeable instrument
#[async_trait]
pub trait Payment: Send + Sync {
    /// Charge `amount`. Fails if `ctx` is done or the amount is out of range.
    async fn process(&self, ctx: &CheckoutContext, amount: Decimal) -> Result<PaymentResult>;

    /// Method tag, e.g. `credit_card`
    fn payment_type(&self) -> &str;

    /// Display-safe description with secrets masked
    fn details(&self) -> BTreeMap<String, String>;
}

/// Type alias for an owned payment
pub type BoxedPayment = Box<dyn Payment>;

/// Payment shared between a strategy and its caller
pub type SharedPayment = Arc<dyn Payment>;

/// Pre-charge checks shared by every instrument
pub(crate) async fn authorize(
    ctx: &CheckoutContext,
    limits: &AmountLimits,
    latency: Duration,
    amount: Decimal,
) -> Result<()> {
    ctx.check()?;
    limits.check(amount)?;
    if !latency.is_zero() {
        ctx.sleep(latency).await?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_approved_echoes_amount() {
        let result = PaymentResult::approved("credit_card", dec!(42.50), Currency::USD);
        assert!(result.success);
        assert_eq!(result.original_amount, dec!(42.50));
        assert_eq!(result.processed_amount, dec!(42.50));
        assert_eq!(result.amount, dec!(42.50));
        assert!(result.metadata.contains_key("processed_at"));
        assert!(result.applied_decorators.is_empty());
    }

    #[test]
    fn test_meta_decimal_roundtrip() {
        let mut result = PaymentResult::approved("paypal", dec!(10), Currency::USD);
        result.insert_meta("discount_amount", money_value(dec!(1.005)));
        assert_eq!(result.meta_decimal("discount_amount"), Some(dec!(1.01)));
        assert_eq!(result.meta_decimal("missing"), None);
    }

    #[test]
    fn test_amount_limits() {
        let limits = AmountLimits::new(dec!(1), dec!(10000));
        assert!(limits.check(dec!(1)).is_ok());
        assert!(limits.check(dec!(10000)).is_ok());
        assert!(limits.check(dec!(0.99)).is_err());
        assert!(limits.check(dec!(10000.01)).is_err());
    }
}
