//! # Currency Exchange
//!
//! Fiat conversion through a KZT pivot: every rate is "units of KZT per one
//! unit of the currency". Used by debit quotes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PaymentError, Result};
use crate::money::{round_money, Currency};

/// Rate table keyed by currency
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRates {
    rates: HashMap<Currency, Decimal>,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self {
            rates: HashMap::from([
                (Currency::USD, Decimal::new(538, 0)),
                (Currency::EUR, Decimal::new(580, 0)),
                (Currency::RUB, Decimal::new(58, 1)),
                (Currency::CNY, Decimal::new(75, 0)),
                (Currency::KZT, Decimal::ONE),
            ]),
        }
    }
}

impl ExchangeRates {
    pub fn rate(&self, currency: Currency) -> Result<Decimal> {
        self.rates
            .get(&currency)
            .copied()
            .filter(|r| !r.is_zero())
            .ok_or_else(|| PaymentError::Validation(format!("no exchange rate for {currency}")))
    }

    /// How many `to` one unit of `from` buys
    pub fn cross_rate(&self, from: Currency, to: Currency) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.rate(from)?
            .checked_div(self.rate(to)?)
            .ok_or_else(|| out_of_range(from, to))
    }

    /// Convert `amount` from one currency to another, unrounded
    pub fn convert(&self, amount: Decimal, from: Currency, to: Currency) -> Result<Decimal> {
        if from == to {
            return Ok(amount);
        }
        let (from_rate, to_rate) = (self.rate(from)?, self.rate(to)?);
        amount
            .checked_mul(from_rate)
            .and_then(|pivot| pivot.checked_div(to_rate))
            .ok_or_else(|| out_of_range(from, to))
    }
}

fn out_of_range(from: Currency, to: Currency) -> PaymentError {
    PaymentError::Validation(format!("amount out of range for {from} to {to} conversion"))
}

/// Result of checking a cart total against a balance in another currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebitQuote {
    pub from: Currency,
    pub to: Currency,
    pub exchange_rate: Decimal,
    pub original_amount: Decimal,
    pub converted_amount: Decimal,
    /// Balance expressed in `to`
    pub available: Decimal,
    pub sufficient: bool,
    pub remaining: Decimal,
}

impl DebitQuote {
    /// Convert `amount` and `balance` (both in `from`) into `to` and compare them
    pub fn build(
        rates: &ExchangeRates,
        amount: Decimal,
        balance: Decimal,
        from: Currency,
        to: Currency,
    ) -> Result<Self> {
        let converted_amount = round_money(rates.convert(amount, from, to)?);
        let available = round_money(rates.convert(balance, from, to)?);
        let sufficient = available >= converted_amount;
        Ok(Self {
            from,
            to,
            exchange_rate: rates.cross_rate(from, to)?.round_dp(4),
            original_amount: amount,
            converted_amount,
            available,
            sufficient,
            remaining: if sufficient {
                available - converted_amount
            } else {
                Decimal::ZERO
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convert_through_pivot() {
        let rates = ExchangeRates::default();
        assert_eq!(rates.convert(dec!(10), Currency::USD, Currency::KZT).unwrap(), dec!(5380));
        assert_eq!(rates.convert(dec!(58), Currency::EUR, Currency::EUR).unwrap(), dec!(58));
        assert_eq!(
            round_money(rates.convert(dec!(580), Currency::KZT, Currency::EUR).unwrap()),
            dec!(1)
        );
    }

    #[test]
    fn test_overflow_is_a_validation_error() {
        let rates = ExchangeRates::default();
        let err = rates.convert(Decimal::MAX, Currency::USD, Currency::KZT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = DebitQuote::build(&rates, dec!(10), Decimal::MAX, Currency::EUR, Currency::RUB).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_crypto_has_no_rate() {
        let rates = ExchangeRates::default();
        assert!(rates.convert(dec!(1), Currency::BTC, Currency::USD).is_err());
    }

    #[test]
    fn test_debit_quote() {
        let rates = ExchangeRates::default();
        let quote = DebitQuote::build(&rates, dec!(100), dec!(1000), Currency::USD, Currency::KZT).unwrap();
        assert_eq!(quote.converted_amount, dec!(53800));
        assert!(quote.sufficient);
        assert_eq!(quote.remaining, dec!(484200));

        let short = DebitQuote::build(&rates, dec!(100), dec!(50), Currency::USD, Currency::KZT).unwrap();
        assert!(!short.sufficient);
        assert_eq!(short.remaining, Decimal::ZERO);
    }

    #[test]
    fn test_rates_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            exchange: ExchangeRates,
        }
        let parsed: Wrapper = toml::from_str("[exchange]\nUSD = 500\nKZT = 1\n").unwrap();
        assert_eq!(parsed.exchange.rate(Currency::USD).unwrap(), dec!(500));
        assert!(parsed.exchange.rate(Currency::EUR).is_err());
    }
}
