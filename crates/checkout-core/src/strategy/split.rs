use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::PaymentStrategy;
use crate::context::CheckoutContext;
use crate::error::{ErrorKind, PaymentError, Result};
use crate::money::{round_money, Currency};
use crate::payment::{money_value, BoxedPayment, Payment, PaymentResult, SharedPayment};

/// One instrument and the share of the total it covers
pub struct SplitPart {
    pub payment: SharedPayment,
    pub amount: Decimal,
}

impl SplitPart {
    pub fn new(payment: BoxedPayment, amount: Decimal) -> Self {
        Self {
            payment: payment.into(),
            amount,
        }
    }
}

/// Sequential charges across several instruments.
///
/// The parts carry their own instruments, so the payment handed to
/// `execute` is only the caller's handle on the first part.
///
/// A failed part fails the whole split. Parts already charged are only logged
/// as rolled back: no compensating charge is issued against their instruments.
pub struct SplitStrategy {
    parts: Vec<SplitPart>,
    name: String,
}

impl SplitStrategy {
    pub const MAX_PARTS: usize = 5;

    pub fn new(parts: Vec<SplitPart>) -> Result<Self> {
        Self::with_max_parts(parts, Self::MAX_PARTS)
    }

    /// 1..=`max_parts` parts, each with a positive amount
    pub fn with_max_parts(parts: Vec<SplitPart>, max_parts: usize) -> Result<Self> {
        if parts.is_empty() {
            return Err(PaymentError::Validation(
                "split payment requires at least one payment method".into(),
            ));
        }
        if parts.len() > max_parts {
            return Err(PaymentError::Validation(format!(
                "split payment supports at most {max_parts} payment methods"
            )));
        }
        if let Some(i) = parts.iter().position(|p| p.amount <= Decimal::ZERO) {
            return Err(PaymentError::Validation(format!(
                "split payment part {} amount must be positive",
                i + 1
            )));
        }

        let name = format!("split_{}_methods", parts.len());
        Ok(Self { parts, name })
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    fn log_rollback(&self, completed: &[PaymentResult]) {
        warn!(
            processed_parts = completed.len(),
            "Split payment failed, rolling back processed parts"
        );
        for (i, result) in completed.iter().enumerate() {
            info!(
                part = i + 1,
                transaction_id = %result.transaction_id,
                amount = %result.amount,
                "Rolled back split payment part (log only, no reversal issued)"
            );
        }
    }
}

#[async_trait]
impl PaymentStrategy for SplitStrategy {
    #[instrument(skip(self, ctx, _payment), fields(parts = self.parts.len()))]
    async fn execute(
        &self,
        ctx: &CheckoutContext,
        _payment: &dyn Payment,
        amount: Decimal,
    ) -> Result<PaymentResult> {
        if amount <= Decimal::ZERO {
            return Err(PaymentError::Validation("split payment total must be positive".into()));
        }
        let sum: Decimal = self.parts.iter().map(|p| p.amount).sum();
        if round_money(sum) != round_money(amount) {
            return Err(PaymentError::Validation(format!(
                "split amounts ({:.2}) do not match total ({:.2})",
                round_money(sum),
                round_money(amount)
            )));
        }

        let mut completed: Vec<PaymentResult> = Vec::with_capacity(self.parts.len());
        for (i, part) in self.parts.iter().enumerate() {
            match part.payment.process(ctx, part.amount).await {
                Ok(result) => {
                    info!(part = i + 1, method = part.payment.payment_type(), amount = %part.amount, "Split part processed");
                    completed.push(result);
                }
                Err(e) => {
                    self.log_rollback(&completed);
                    return Err(PaymentError::wrap(
                        e,
                        ErrorKind::PaymentFailed,
                        format!("split payment part {} failed", i + 1),
                    ));
                }
            }
        }

        let details: Vec<_> = self
            .parts
            .iter()
            .zip(&completed)
            .enumerate()
            .map(|(i, (part, result))| {
                json!({
                    "part": i + 1,
                    "payment_method": part.payment.payment_type(),
                    "amount": money_value(part.amount),
                    "transaction_id": result.transaction_id,
                    "status": "completed",
                })
            })
            .collect();

        let first_id = completed
            .first()
            .map(|r| r.transaction_id.clone())
            .unwrap_or_default();
        let mut combined = PaymentResult::approved("split", amount, Currency::USD)
            .with_message(format!("split payment across {} methods completed", completed.len()));
        combined.transaction_id = first_id;
        combined.insert_meta("payment_strategy", "split");
        combined.insert_meta("payment_count", completed.len());
        combined.insert_meta("split_details", details);
        Ok(combined)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
