use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::Adjustment;
use crate::error::{PaymentError, Result};
use crate::money::percent_of;
use crate::payment::money_value;

/// Points redemption plus accrual of new points
#[derive(Debug, Clone)]
pub struct LoyaltyPoints {
    available_points: u64,
    points_to_redeem: u64,
    /// Points per one unit of currency
    points_to_currency_ratio: Decimal,
    max_redemption_percentage: Decimal,
}

impl LoyaltyPoints {
    pub fn new(
        available_points: u64,
        points_to_redeem: u64,
        points_to_currency_ratio: Decimal,
        max_redemption_percentage: Decimal,
    ) -> Result<Self> {
        if points_to_redeem > available_points {
            return Err(PaymentError::Validation(format!(
                "insufficient loyalty points: requested {points_to_redeem}, available {available_points}"
            )));
        }
        if points_to_currency_ratio <= Decimal::ZERO {
            return Err(PaymentError::Configuration(
                "points to currency ratio must be positive".into(),
            ));
        }
        Ok(Self {
            available_points,
            points_to_redeem,
            points_to_currency_ratio,
            max_redemption_percentage,
        })
    }

    /// Currency value of the points being redeemed
    pub fn discount(&self) -> Decimal {
        Decimal::from(self.points_to_redeem) / self.points_to_currency_ratio
    }

    /// One point per whole unit of the pre-redemption amount
    pub fn points_earned(amount: Decimal) -> u64 {
        amount.floor().to_u64().unwrap_or(0)
    }

    pub(super) fn apply(&self, amount: Decimal) -> Result<Adjustment> {
        let discount = self.discount();
        let max_redemption = percent_of(amount, self.max_redemption_percentage);
        if discount > max_redemption {
            return Err(PaymentError::Validation(format!(
                "loyalty points redemption exceeds maximum ({}% of purchase)",
                self.max_redemption_percentage
            )));
        }

        let earned = Self::points_earned(amount);
        let balance_after = self.available_points - self.points_to_redeem + earned;

        Ok(Adjustment::passthrough((amount - discount).max(Decimal::ZERO))
            .fact("loyalty_points_redeemed", self.points_to_redeem)
            .fact("loyalty_points_earned", earned)
            .fact("loyalty_discount", money_value(discount))
            .fact("loyalty_balance_after", balance_after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_construction_rules() {
        assert!(LoyaltyPoints::new(100, 101, dec!(100), dec!(50)).is_err());
        assert!(LoyaltyPoints::new(100, 100, dec!(0), dec!(50)).is_err());
        assert!(LoyaltyPoints::new(100, 100, dec!(100), dec!(50)).is_ok());
    }

    #[test]
    fn test_redemption_reduces_charge() {
        let loyalty = LoyaltyPoints::new(500, 500, dec!(100), dec!(50)).unwrap();
        let adj = loyalty.apply(dec!(100.75)).unwrap();

        assert_eq!(adj.forward, dec!(95.75));
        assert!(adj.facts.contains(&("loyalty_points_earned", 100.into())));
        assert!(adj.facts.contains(&("loyalty_balance_after", 100.into())));
    }

    #[test]
    fn test_cap_boundary() {
        let loyalty = LoyaltyPoints::new(1000, 1000, dec!(100), dec!(50)).unwrap();
        // 10.00 discount on 20.00 is exactly 50%
        assert!(loyalty.apply(dec!(20)).is_ok());
        assert!(loyalty.apply(dec!(19.99)).is_err());
    }
}
