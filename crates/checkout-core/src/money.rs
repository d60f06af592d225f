//! # Money Types
//!
//! Currency codes and decimal helpers. Amounts are `rust_decimal::Decimal`
//! in major units (dollars, not cents).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PaymentError;

/// Supported currencies (ISO 4217 plus the crypto assets the engine accepts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    USD,
    EUR,
    RUB,
    CNY,
    KZT,
    BTC,
    ETH,
    USDT,
}

impl Currency {
    /// Returns the currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::RUB => "RUB",
            Currency::CNY => "CNY",
            Currency::KZT => "KZT",
            Currency::BTC => "BTC",
            Currency::ETH => "ETH",
            Currency::USDT => "USDT",
        }
    }

    /// Fiat currencies have an exchange rate, crypto assets don't
    pub fn is_fiat(&self) -> bool {
        !matches!(self, Currency::BTC | Currency::ETH | Currency::USDT)
    }

    /// Format for display (e.g., "$10.00")
    pub fn display(&self, amount: Decimal) -> String {
        let amount = round_money(amount);
        match self {
            Currency::USD => format!("${amount:.2}"),
            Currency::EUR => format!("€{amount:.2}"),
            other => format!("{amount:.2} {}", other.as_str()),
        }
    }
}

impl FromStr for Currency {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "RUB" => Ok(Currency::RUB),
            "CNY" => Ok(Currency::CNY),
            "KZT" => Ok(Currency::KZT),
            "BTC" => Ok(Currency::BTC),
            "ETH" => Ok(Currency::ETH),
            "USDT" => Ok(Currency::USDT),
            other => Err(PaymentError::Validation(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round to cents, half away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// `value` percent of `amount`
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

/// Amount in whole cents, used by counters that need integer arithmetic
pub fn to_cents(amount: Decimal) -> i64 {
    use rust_decimal::prelude::ToPrimitive;
    (round_money(amount) * Decimal::ONE_HUNDRED)
        .to_i64()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_parse() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!(" btc ".parse::<Currency>().unwrap(), Currency::BTC);
        assert!("doge".parse::<Currency>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Currency::USD.display(dec!(10)), "$10.00");
        assert_eq!(Currency::KZT.display(dec!(5380.005)), "5380.01 KZT");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(percent_of(dec!(100), dec!(10)), dec!(10));
        assert_eq!(round_money(dec!(33.335)), dec!(33.34));
        assert_eq!(to_cents(dec!(999.99)), 99_999);
    }
}
