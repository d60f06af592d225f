//! # Input Validators
//!
//! Format checks for instrument data and customer fields. Every check returns
//! a validation-kind [`PaymentError`].

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;

use crate::customer::Address;
use crate::error::{PaymentError, Result};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("email regex")
});
static CVV: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("cvv regex"));
static EXPIRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})/(\d{2})$").expect("expiry regex"));

fn invalid(msg: impl Into<String>) -> PaymentError {
    PaymentError::Validation(msg.into())
}

/// Strip spaces and dashes, then require 13-19 digits passing the Luhn check.
/// Returns the normalized digits.
pub fn validate_card_number(number: &str) -> Result<String> {
    let digits: String = number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();

    if digits.is_empty() {
        return Err(invalid("card number is required"));
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("card number must contain only digits"));
    }
    if !(13..=19).contains(&digits.len()) {
        return Err(invalid("card number must be 13-19 digits"));
    }
    if !luhn(&digits) {
        return Err(invalid("card number failed checksum"));
    }
    Ok(digits)
}

/// Luhn checksum over an all-digit string
pub fn luhn(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

pub fn validate_cvv(cvv: &str) -> Result<()> {
    if CVV.is_match(cvv) {
        Ok(())
    } else {
        Err(invalid("CVV must be 3 or 4 digits"))
    }
}

/// `MM/YY` with month 01-12
pub fn validate_expiry(expiry: &str) -> Result<()> {
    let caps = EXPIRY
        .captures(expiry)
        .ok_or_else(|| invalid("expiry date must be in MM/YY format"))?;
    let month: u32 = caps[1]
        .parse()
        .map_err(|_| invalid("invalid expiry month"))?;
    if !(1..=12).contains(&month) {
        return Err(invalid("expiry month must be between 01 and 12"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(invalid("email is required"));
    }
    if EMAIL.is_match(email) {
        Ok(())
    } else {
        Err(invalid(format!("invalid email format: {email}")))
    }
}

/// Optional leading `+`, then 10-15 digits once separators are removed
pub fn validate_phone(phone: &str) -> Result<()> {
    let body = phone.strip_prefix('+').unwrap_or(phone);
    let digits: String = body
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("phone number must contain only digits"));
    }
    if !(10..=15).contains(&digits.len()) {
        return Err(invalid("phone number must be 10-15 digits"));
    }
    Ok(())
}

pub fn validate_address(address: &Address) -> Result<()> {
    if address.street.trim().is_empty() {
        return Err(invalid("street is required"));
    }
    if address.city.trim().is_empty() {
        return Err(invalid("city is required"));
    }
    if address.country.trim().is_empty() {
        return Err(invalid("country is required"));
    }
    Ok(())
}

/// Positive with at most two decimal places
pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(invalid("amount must be positive"));
    }
    if amount.normalize().scale() > 2 {
        return Err(invalid("amount cannot have more than 2 decimal places"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_card_number() {
        assert_eq!(
            validate_card_number("4532 0151-1283 0366").unwrap(),
            "4532015112830366"
        );
        assert!(validate_card_number("4532015112830367").is_err());
        assert!(validate_card_number("1234").is_err());
        assert!(validate_card_number("4532abcd12830366").is_err());
        assert!(validate_card_number("").is_err());
    }

    #[test]
    fn test_cvv_and_expiry() {
        assert!(validate_cvv("123").is_ok());
        assert!(validate_cvv("1234").is_ok());
        assert!(validate_cvv("12").is_err());
        assert!(validate_expiry("12/30").is_ok());
        assert!(validate_expiry("13/30").is_err());
        assert!(validate_expiry("00/30").is_err());
        assert!(validate_expiry("1230").is_err());
    }

    #[test]
    fn test_email_and_phone() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_phone("+1 (234) 567-8901").is_ok());
        assert!(validate_phone("12345").is_err());
    }

    #[test]
    fn test_address() {
        let mut address = Address {
            street: "1 Main St".into(),
            city: "Springfield".into(),
            country: "USA".into(),
            ..Address::default()
        };
        assert!(validate_address(&address).is_ok());
        address.city.clear();
        assert!(validate_address(&address).is_err());
    }

    #[test]
    fn test_amount() {
        assert!(validate_amount(dec!(10.50)).is_ok());
        assert!(validate_amount(dec!(10.500)).is_ok());
        assert!(validate_amount(dec!(10.505)).is_err());
        assert!(validate_amount(Decimal::ZERO).is_err());
    }
}
