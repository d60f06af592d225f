use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Adjustment;
use crate::error::{PaymentError, Result};
use crate::money::percent_of;
use crate::payment::money_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
        }
    }
}

/// Percentage or fixed reduction, capped so the charge never goes negative
#[derive(Debug, Clone)]
pub struct Discount {
    kind: DiscountKind,
    value: Decimal,
    /// Upper bound on the computed discount; zero means uncapped
    max_discount: Decimal,
    min_amount: Decimal,
    expires_at: Option<DateTime<Utc>>,
    code: String,
}

impl Discount {
    /// Value must be positive; a percentage may not exceed 100
    pub fn new(kind: DiscountKind, value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(PaymentError::Validation("discount value must be positive".into()));
        }
        if kind == DiscountKind::Percentage && value > Decimal::ONE_HUNDRED {
            return Err(PaymentError::Validation("percentage discount cannot exceed 100%".into()));
        }
        Ok(Self {
            kind,
            value,
            max_discount: Decimal::ZERO,
            min_amount: Decimal::ZERO,
            expires_at: None,
            code: String::new(),
        })
    }

    pub fn percentage(value: Decimal) -> Result<Self> {
        Self::new(DiscountKind::Percentage, value)
    }

    pub fn fixed(value: Decimal) -> Result<Self> {
        Self::new(DiscountKind::Fixed, value)
    }

    /// Builder: cap the discount
    pub fn with_max_discount(mut self, max: Decimal) -> Self {
        self.max_discount = max;
        self
    }

    /// Builder: minimum purchase amount
    pub fn with_min_amount(mut self, min: Decimal) -> Self {
        self.min_amount = min;
        self
    }

    /// Builder: expiry
    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Builder: coupon code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }

    /// Discount for `amount` after both caps
    pub fn discount_for(&self, amount: Decimal) -> Decimal {
        let raw = match self.kind {
            DiscountKind::Percentage => percent_of(amount, self.value),
            DiscountKind::Fixed => self.value,
        };
        let capped = if self.max_discount > Decimal::ZERO {
            raw.min(self.max_discount)
        } else {
            raw
        };
        capped.min(amount)
    }

    pub(super) fn apply(&self, amount: Decimal) -> Result<Adjustment> {
        if self.is_expired() {
            return Err(PaymentError::Validation("discount code has expired".into()));
        }
        if amount < self.min_amount {
            return Err(PaymentError::Validation(format!(
                "minimum purchase amount of {} required for discount",
                self.min_amount
            )));
        }

        let discount = self.discount_for(amount);
        let forward = (amount - discount).max(Decimal::ZERO);

        Ok(Adjustment::passthrough(forward)
            .fact("discount_type", self.kind.as_str())
            .fact("discount_value", money_value(self.value))
            .fact("discount_amount", money_value(discount))
            .fact("discount_code", self.code.as_str()))
    }
}
