use rust_decimal::Decimal;
use std::collections::HashMap;

use super::Adjustment;
use crate::money::percent_of;
use crate::payment::money_value;

/// Additive tax at a regional rate
#[derive(Debug, Clone)]
pub struct Tax {
    rate: Decimal,
    region: String,
}

impl Tax {
    pub fn new(rate: Decimal, region: impl Into<String>) -> Self {
        Self {
            rate,
            region: region.into(),
        }
    }

    /// Look `region` up in `rates`, falling back to `default_rate`
    pub fn for_region(region: &str, rates: &HashMap<String, Decimal>, default_rate: Decimal) -> Self {
        let rate = rates.get(region).copied().unwrap_or(default_rate);
        Self::new(rate, region)
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub(super) fn apply(&self, amount: Decimal) -> Adjustment {
        let tax = percent_of(amount, self.rate);
        Adjustment::passthrough(amount + tax)
            .fact("subtotal", money_value(amount))
            .fact("tax_amount", money_value(tax))
            .fact("tax_rate", self.rate.to_string())
            .fact("tax_region", self.region.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_region_lookup() {
        let rates = HashMap::from([("CA".to_string(), dec!(7.25))]);
        assert_eq!(Tax::for_region("CA", &rates, dec!(10)).rate(), dec!(7.25));
        assert_eq!(Tax::for_region("ZZ", &rates, dec!(10)).rate(), dec!(10));
    }

    #[test]
    fn test_additive() {
        let adj = Tax::new(dec!(7.25), "CA").apply(dec!(200));
        assert_eq!(adj.forward, dec!(214.50));
    }
}
