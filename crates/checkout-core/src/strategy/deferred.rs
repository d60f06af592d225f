use async_trait::async_trait;
use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::PaymentStrategy;
use crate::context::CheckoutContext;
use crate::error::{ErrorKind, PaymentError, Result};
use crate::money::{percent_of, round_money};
use crate::payment::{money_value, AmountLimits, Payment, PaymentResult};

/// One scheduled payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub status: String,
}

/// Full repayment plan for a deferred purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentSchedule {
    pub id: String,
    /// Purchase amount before interest
    pub total_amount: Decimal,
    pub total_with_interest: Decimal,
    pub installments: u32,
    pub interest_rate: Decimal,
    pub payments: Vec<Installment>,
}

impl InstallmentSchedule {
    /// Spread `amount` plus interest evenly over `installments` monthly
    /// payments, rounded to cents. The last payment absorbs the remainder.
    pub fn build(amount: Decimal, installments: u32, interest_rate: Decimal) -> Self {
        let total_with_interest = round_money(amount + percent_of(amount, interest_rate));
        let count = Decimal::from(installments.max(1));
        let regular = round_money(total_with_interest / count);
        let last = total_with_interest - regular * (count - Decimal::ONE);

        let now = Utc::now();
        let payments = (1..=installments)
            .map(|number| Installment {
                number,
                amount: if number == installments { last } else { regular },
                due_date: now
                    .checked_add_months(Months::new(number - 1))
                    .unwrap_or(now),
                status: "pending".to_string(),
            })
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            total_amount: amount,
            total_with_interest,
            installments,
            interest_rate,
            payments,
        }
    }

    pub fn first_installment(&self) -> Decimal {
        self.payments
            .first()
            .map(|p| p.amount)
            .unwrap_or(self.total_with_interest)
    }
}

/// Charge the first installment now, schedule the rest
#[derive(Debug, Clone)]
pub struct DeferredStrategy {
    limits: AmountLimits,
    installments: u32,
    interest_rate: Decimal,
    name: String,
}

impl DeferredStrategy {
    pub const MIN_INSTALLMENTS: u32 = 2;
    pub const MAX_INSTALLMENTS: u32 = 12;

    /// `installments` must be within 2..=12
    pub fn new(limits: AmountLimits, installments: u32, interest_rate: Decimal) -> Result<Self> {
        Self::with_bounds(
            limits,
            installments,
            interest_rate,
            Self::MIN_INSTALLMENTS,
            Self::MAX_INSTALLMENTS,
        )
    }

    /// Like [`new`](Self::new) with configurable installment bounds
    pub fn with_bounds(
        limits: AmountLimits,
        installments: u32,
        interest_rate: Decimal,
        min_installments: u32,
        max_installments: u32,
    ) -> Result<Self> {
        if !(min_installments..=max_installments).contains(&installments) {
            return Err(PaymentError::Validation(format!(
                "installments must be between {min_installments} and {max_installments}"
            )));
        }
        if interest_rate < Decimal::ZERO {
            return Err(PaymentError::Validation("interest rate cannot be negative".into()));
        }
        Ok(Self {
            limits,
            installments,
            interest_rate,
            name: format!("deferred_{installments}_installments"),
        })
    }

    pub fn installments(&self) -> u32 {
        self.installments
    }
}

#[async_trait]
impl PaymentStrategy for DeferredStrategy {
    #[instrument(skip(self, ctx, payment), fields(installments = self.installments))]
    async fn execute(
        &self,
        ctx: &CheckoutContext,
        payment: &dyn Payment,
        amount: Decimal,
    ) -> Result<PaymentResult> {
        self.limits.check(amount)?;

        let schedule = InstallmentSchedule::build(amount, self.installments, self.interest_rate);
        let first = schedule.first_installment();
        info!(schedule_id = %schedule.id, %first, "Processing first installment");

        let mut result = payment.process(ctx, first).await.map_err(|e| {
            PaymentError::wrap(e, ErrorKind::PaymentFailed, "deferred payment first installment failed")
        })?;

        result.original_amount = amount;
        result.amount = first;
        result.processed_amount = first;
        result.insert_meta("payment_strategy", "deferred");
        result.insert_meta("schedule_id", schedule.id.as_str());
        result.insert_meta("total_amount", money_value(schedule.total_amount));
        result.insert_meta("total_with_interest", money_value(schedule.total_with_interest));
        result.insert_meta("installments", schedule.installments);
        result.insert_meta("interest_rate", schedule.interest_rate.to_string());
        result.insert_meta("first_installment", money_value(first));
        result.insert_meta("remaining_installments", schedule.installments - 1);
        result.insert_meta("installment_schedule", serde_json::to_value(&schedule.payments)?);
        Ok(result)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::testing::RecordingPayment;
    use rust_decimal_macros::dec;

    fn limits() -> AmountLimits {
        AmountLimits::new(dec!(100), dec!(10000))
    }

    #[test]
    fn test_installment_bounds() {
        assert!(DeferredStrategy::new(limits(), 1, dec!(0)).is_err());
        assert!(DeferredStrategy::new(limits(), 13, dec!(0)).is_err());
        assert_eq!(
            DeferredStrategy::new(limits(), 12, dec!(0)).unwrap().name(),
            "deferred_12_installments"
        );
    }

    #[test]
    fn test_schedule_sums_to_total() {
        let schedule = InstallmentSchedule::build(dec!(100), 3, dec!(0));
        let sum: Decimal = schedule.payments.iter().map(|p| p.amount).sum();

        assert_eq!(sum, dec!(100));
        assert_eq!(schedule.first_installment(), round_money(dec!(100) / dec!(3)));
        assert_eq!(schedule.payments[2].amount, dec!(33.34));
        assert!(schedule.payments.iter().all(|p| p.status == "pending"));
    }

    #[test]
    fn test_schedule_with_interest() {
        let schedule = InstallmentSchedule::build(dec!(1200), 12, dec!(10));
        assert_eq!(schedule.total_with_interest, dec!(1320));
        assert!(schedule.payments.iter().all(|p| p.amount == dec!(110)));
    }

    #[tokio::test]
    async fn test_charges_first_installment_only() {
        let payment = RecordingPayment::default();
        let strategy = DeferredStrategy::new(limits(), 3, dec!(0)).unwrap();

        let result = strategy
            .execute(&CheckoutContext::new(), &payment, dec!(300))
            .await
            .unwrap();

        assert_eq!(payment.charged(), vec![dec!(100)]);
        assert_eq!(result.amount, dec!(100));
        assert_eq!(result.processed_amount, dec!(100));
        assert_eq!(result.original_amount, dec!(300));
        assert_eq!(result.meta_u64("remaining_installments"), Some(2));
        assert_eq!(result.metadata["payment_strategy"], "deferred");
    }

    #[tokio::test]
    async fn test_range_checked_before_charge() {
        let payment = RecordingPayment::default();
        let strategy = DeferredStrategy::new(limits(), 3, dec!(0)).unwrap();
        assert!(strategy
            .execute(&CheckoutContext::new(), &payment, dec!(99.99))
            .await
            .is_err());
        assert_eq!(payment.call_count(), 0);
    }
}
