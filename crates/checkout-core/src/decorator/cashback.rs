use rust_decimal::Decimal;

use super::Adjustment;
use crate::money::percent_of;
use crate::payment::money_value;

/// Two-tier cashback, reported but not deducted
#[derive(Debug, Clone)]
pub struct Cashback {
    tier1_percentage: Decimal,
    tier2_percentage: Decimal,
    /// Amounts at or above this earn the tier 2 percentage
    threshold: Decimal,
}

impl Cashback {
    pub fn new(tier1_percentage: Decimal, tier2_percentage: Decimal, threshold: Decimal) -> Self {
        Self {
            tier1_percentage,
            tier2_percentage,
            threshold,
        }
    }

    pub fn percentage_for(&self, amount: Decimal) -> Decimal {
        if amount >= self.threshold {
            self.tier2_percentage
        } else {
            self.tier1_percentage
        }
    }

    pub(super) fn apply(&self, amount: Decimal) -> Adjustment {
        let percentage = self.percentage_for(amount);
        Adjustment::passthrough(amount)
            .fact("cashback_amount", money_value(percent_of(amount, percentage)))
            .fact("cashback_percentage", percentage.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tiers() {
        let cashback = Cashback::new(dec!(1), dec!(2), dec!(500));
        assert_eq!(cashback.percentage_for(dec!(499.99)), dec!(1));
        assert_eq!(cashback.percentage_for(dec!(500)), dec!(2));

        let adj = cashback.apply(dec!(200));
        assert_eq!(adj.forward, dec!(200));
        assert!(adj.facts.contains(&("cashback_amount", "2.00".into())));
    }
}
