//! # Decorator Chain
//!
//! A [`Decorated`] node owns exactly one inner [`Payment`] and one
//! [`Feature`] policy. It is itself a `Payment`, so nodes nest:
//!
//! ```text
//!  caller ──100──▶ Decorated(tax 10%) ──110──▶ Decorated(discount 10%) ──99──▶ CreditCard
//!                                                                              │
//!  result ◀── applied: [discount, tax] ◀── applied: [discount] ◀───────────────┘
//! ```
//!
//! On the way in each feature computes the amount to forward. On the way out
//! it appends its name, writes its facts into metadata and records the amount
//! it was called with as `original_amount`, so the outermost node leaves the
//! caller-facing amount there. `processed_amount` is left as the innermost
//! instrument reported it: the amount actually charged.
//!
//! Errors from the inner payment are never caught.

mod cashback;
mod discount;
mod fraud;
mod loyalty;
mod tax;

pub use cashback::Cashback;
pub use discount::{Discount, DiscountKind};
pub use fraud::{FraudDetection, RandomSource, StdRandom, VelocityWindow};
pub use loyalty::LoyaltyPoints;
pub use tax::Tax;

#[cfg(test)]
pub(crate) use fraud::tests::ScriptedRandom;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::context::CheckoutContext;
use crate::error::Result;
use crate::payment::{BoxedPayment, Payment, PaymentResult};

/// What a feature decided for one amount
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    /// Amount to hand to the inner payment
    pub forward: Decimal,
    /// Metadata written into the result after a successful charge
    pub facts: Vec<(&'static str, Value)>,
}

impl Adjustment {
    /// Forward the amount unchanged
    pub fn passthrough(amount: Decimal) -> Self {
        Self {
            forward: amount,
            facts: Vec::new(),
        }
    }

    pub fn fact(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.facts.push((key, value.into()));
        self
    }
}

/// The decorator policies
#[derive(Debug)]
pub enum Feature {
    Discount(Discount),
    Tax(Tax),
    Cashback(Cashback),
    FraudDetection(FraudDetection),
    LoyaltyPoints(LoyaltyPoints),
}

impl Feature {
    /// Name recorded in `applied_decorators`
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Discount(_) => "discount",
            Feature::Tax(_) => "tax",
            Feature::Cashback(_) => "cashback",
            Feature::FraudDetection(_) => "fraud_detection",
            Feature::LoyaltyPoints(_) => "loyalty_points",
        }
    }

    fn prepare(&self, amount: Decimal) -> Result<Adjustment> {
        match self {
            Feature::Discount(d) => d.apply(amount),
            Feature::Tax(t) => Ok(t.apply(amount)),
            Feature::Cashback(c) => Ok(c.apply(amount)),
            Feature::FraudDetection(f) => f.screen(amount),
            Feature::LoyaltyPoints(l) => l.apply(amount),
        }
    }

    fn settle(&self) {
        if let Feature::FraudDetection(f) = self {
            f.record();
        }
    }
}

/// A payment wrapped by one feature
pub struct Decorated {
    feature: Feature,
    inner: BoxedPayment,
}

impl Decorated {
    pub fn new(feature: Feature, inner: BoxedPayment) -> Self {
        Self { feature, inner }
    }

    /// Wrap and box in one step, for folds
    pub fn wrap(inner: BoxedPayment, feature: Feature) -> BoxedPayment {
        Box::new(Self::new(feature, inner))
    }

    pub fn feature(&self) -> &Feature {
        &self.feature
    }
}

#[async_trait]
impl Payment for Decorated {
    async fn process(&self, ctx: &CheckoutContext, amount: Decimal) -> Result<PaymentResult> {
        let name = self.feature.name();
        let adjustment = self.feature.prepare(amount)?;
        debug!(decorator = name, %amount, forward = %adjustment.forward, "Applying decorator");

        let mut result = self.inner.process(ctx, adjustment.forward).await?;
        self.feature.settle();

        result.original_amount = amount;
        result.applied_decorators.push(name.to_string());
        for (key, value) in adjustment.facts {
            result.metadata.insert(key.to_string(), value);
        }
        Ok(result)
    }

    fn payment_type(&self) -> &str {
        self.inner.payment_type()
    }

    fn details(&self) -> BTreeMap<String, String> {
        let mut details = self.inner.details();
        let chain = match details.remove("decorators") {
            Some(inner) => format!("{},{inner}", self.feature.name()),
            None => self.feature.name().to_string(),
        };
        details.insert("decorators".to_string(), chain);
        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PaymentError};
    use crate::payment::testing::RecordingPayment;
    use rust_decimal_macros::dec;

    fn base() -> (RecordingPayment, BoxedPayment) {
        let recorder = RecordingPayment::default();
        (recorder.clone(), Box::new(recorder))
    }

    #[tokio::test]
    async fn test_percentage_discount() {
        let (_, inner) = base();
        let payment = Decorated::new(Feature::Discount(Discount::percentage(dec!(10)).unwrap()), inner);

        let result = payment.process(&CheckoutContext::new(), dec!(100.00)).await.unwrap();
        assert_eq!(result.processed_amount, dec!(90.00));
        assert_eq!(result.amount, dec!(90.00));
        assert_eq!(result.original_amount, dec!(100.00));
        assert_eq!(result.applied_decorators, vec!["discount"]);
        assert_eq!(result.meta_decimal("discount_amount"), Some(dec!(10)));
    }

    #[tokio::test]
    async fn test_fixed_discount() {
        let (_, inner) = base();
        let payment = Decorated::new(Feature::Discount(Discount::fixed(dec!(20)).unwrap()), inner);

        let result = payment.process(&CheckoutContext::new(), dec!(100.00)).await.unwrap();
        assert_eq!(result.processed_amount, dec!(80.00));
    }

    #[tokio::test]
    async fn test_tax_then_discount_chain() {
        let (recorder, inner) = base();
        let payment = [
            Feature::Tax(Tax::new(dec!(10), "DEFAULT")),
            Feature::Discount(Discount::percentage(dec!(10)).unwrap()),
        ]
        .into_iter()
        .rev()
        .fold(inner, Decorated::wrap);

        let result = payment.process(&CheckoutContext::new(), dec!(100)).await.unwrap();

        assert_eq!(recorder.charged(), vec![dec!(99)]);
        assert_eq!(result.processed_amount, dec!(99));
        assert_eq!(result.amount, dec!(99));
        assert_eq!(result.original_amount, dec!(100));
        assert_eq!(result.applied_decorators, vec!["discount", "tax"]);
        assert_eq!(result.meta_decimal("tax_amount"), Some(dec!(10)));
        assert_eq!(result.meta_decimal("discount_amount"), Some(dec!(11)));
    }

    #[tokio::test]
    async fn test_cashback_does_not_change_charge() {
        let (recorder, inner) = base();
        let payment = Decorated::new(
            Feature::Cashback(Cashback::new(dec!(1), dec!(2), dec!(500))),
            inner,
        );

        let result = payment.process(&CheckoutContext::new(), dec!(600)).await.unwrap();
        assert_eq!(recorder.charged(), vec![dec!(600)]);
        assert_eq!(result.meta_decimal("cashback_amount"), Some(dec!(12)));
    }

    #[tokio::test]
    async fn test_inner_error_propagates_unchanged() {
        let recorder = RecordingPayment::failing_with(|| PaymentError::InsufficientFunds("card".into()));
        let payment = Decorated::new(Feature::Tax(Tax::new(dec!(5), "TX")), Box::new(recorder));

        let err = payment.process(&CheckoutContext::new(), dec!(10)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    }

    #[tokio::test]
    async fn test_rejection_short_circuits_inner() {
        let (recorder, inner) = base();
        let loyalty = LoyaltyPoints::new(1000, 900, dec!(100), dec!(50)).unwrap();
        let payment = Decorated::new(Feature::LoyaltyPoints(loyalty), inner);

        let err = payment.process(&CheckoutContext::new(), dec!(10)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(recorder.call_count(), 0);
    }

    #[test]
    fn test_details_list_chain() {
        let (_, inner) = base();
        let payment = Decorated::wrap(
            Decorated::wrap(inner, Feature::Tax(Tax::new(dec!(5), "TX"))),
            Feature::Discount(Discount::fixed(dec!(1)).unwrap()),
        );
        assert_eq!(payment.details()["decorators"], "discount,tax");
        assert_eq!(payment.payment_type(), "test");
    }
}
