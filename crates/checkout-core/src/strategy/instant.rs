use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::PaymentStrategy;
use crate::context::CheckoutContext;
use crate::error::{ErrorKind, PaymentError, Result};
use crate::payment::{AmountLimits, Payment, PaymentResult};

/// Single immediate charge
#[derive(Debug, Clone)]
pub struct InstantStrategy {
    limits: AmountLimits,
}

impl InstantStrategy {
    pub const NAME: &'static str = "instant";

    pub fn new(limits: AmountLimits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl PaymentStrategy for InstantStrategy {
    #[instrument(skip(self, ctx, payment), fields(method = payment.payment_type()))]
    async fn execute(
        &self,
        ctx: &CheckoutContext,
        payment: &dyn Payment,
        amount: Decimal,
    ) -> Result<PaymentResult> {
        self.limits.check(amount)?;

        let mut result = payment.process(ctx, amount).await.map_err(|e| {
            PaymentError::wrap(e, ErrorKind::PaymentFailed, "instant payment processing failed")
        })?;

        result.insert_meta("payment_strategy", Self::NAME);
        info!(transaction_id = %result.transaction_id, amount = %result.amount, "Instant payment completed");
        Ok(result)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
