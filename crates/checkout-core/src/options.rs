//! # Checkout Options
//!
//! Caller-supplied choices for one checkout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::InstrumentDetails;

/// One share of a split payment, as requested by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPartRequest {
    pub payment_method: String,
    pub amount: Decimal,
    /// Instrument fields; the sandbox instrument is used when absent
    #[serde(default)]
    pub details: Option<InstrumentDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutOptions {
    /// `credit_card`, `paypal` or `crypto`
    pub payment_method: String,

    /// `instant`, `deferred` or `split`
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Decorator feature names; the first listed sees the caller's amount first
    #[serde(default)]
    pub decorators: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,

    /// Points to redeem; zero skips the loyalty decorator
    #[serde(default)]
    pub use_loyalty_points: u64,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// Explicit instrument; the configured sandbox instrument is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<InstrumentDetails>,

    /// Parts for the `split` strategy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub split_parts: Vec<SplitPartRequest>,

    /// Installment count for the `deferred` strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
}

fn default_strategy() -> String {
    "instant".to_string()
}

impl CheckoutOptions {
    /// Instant checkout with the given method and no decorators
    pub fn new(payment_method: impl Into<String>) -> Self {
        Self {
            payment_method: payment_method.into(),
            strategy: default_strategy(),
            decorators: Vec::new(),
            discount_code: None,
            use_loyalty_points: 0,
            metadata: HashMap::new(),
            payment_details: None,
            split_parts: Vec::new(),
            installments: None,
        }
    }

    /// Builder: set strategy
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    /// Builder: append a decorator
    pub fn with_decorator(mut self, feature: impl Into<String>) -> Self {
        self.decorators.push(feature.into());
        self
    }

    /// Builder: set discount code
    pub fn with_discount_code(mut self, code: impl Into<String>) -> Self {
        self.discount_code = Some(code.into());
        self
    }

    /// Builder: redeem loyalty points
    pub fn with_loyalty_points(mut self, points: u64) -> Self {
        self.use_loyalty_points = points;
        self
    }

    /// Builder: explicit instrument
    pub fn with_payment_details(mut self, details: InstrumentDetails) -> Self {
        self.payment_details = Some(details);
        self
    }

    /// Builder: add a split part
    pub fn with_split_part(mut self, payment_method: impl Into<String>, amount: Decimal) -> Self {
        self.split_parts.push(SplitPartRequest {
            payment_method: payment_method.into(),
            amount,
            details: None,
        });
        self
    }

    /// Builder: add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
