use tracing::debug;

use crate::config::{InstrumentDetails, PaymentConfig};
use crate::error::{PaymentError, Result};
use crate::payment::{BoxedPayment, CreditCardPayment, CryptoPayment, PayPalPayment};

/// Builds instruments by method name
#[derive(Debug, Clone)]
pub struct PaymentFactory {
    config: PaymentConfig,
}

impl PaymentFactory {
    const SUPPORTED: [&'static str; 3] = [
        CreditCardPayment::TYPE,
        PayPalPayment::TYPE,
        CryptoPayment::TYPE,
    ];

    pub fn new(config: PaymentConfig) -> Self {
        Self { config }
    }

    pub fn is_supported(&self, method: &str) -> bool {
        Self::SUPPORTED.contains(&method)
    }

    pub fn supported_types(&self) -> Vec<&'static str> {
        Self::SUPPORTED.to_vec()
    }

    /// Build `method` from explicit fields, or from the sandbox instrument when `details` is `None`
    pub fn create_or_sandbox(
        &self,
        method: &str,
        details: Option<&InstrumentDetails>,
    ) -> Result<BoxedPayment> {
        match details {
            Some(details) => self.create(method, details),
            None => {
                let sandbox = self.config.sandbox.for_method(method).ok_or_else(|| {
                    PaymentError::InvalidPayment(format!("unsupported payment type: {method}"))
                })?;
                debug!(method, "Using sandbox instrument");
                self.create(method, sandbox)
            }
        }
    }

    pub fn create(&self, method: &str, details: &InstrumentDetails) -> Result<BoxedPayment> {
        let latency = self.config.simulated_latency();
        match method {
            CreditCardPayment::TYPE => {
                let card = CreditCardPayment::new(
                    required(&details.card_number, "card number")?,
                    required(&details.card_holder, "card holder")?,
                    required(&details.expiry_date, "expiry date")?,
                    required(&details.cvv, "CVV")?,
                    self.config.credit_card,
                )?;
                Ok(Box::new(card.with_latency(latency)))
            }
            PayPalPayment::TYPE => {
                let wallet = PayPalPayment::new(
                    required(&details.paypal_email, "paypal email")?,
                    required(&details.paypal_password, "paypal password")?,
                    self.config.paypal,
                )?;
                Ok(Box::new(wallet.with_latency(latency)))
            }
            CryptoPayment::TYPE => {
                let wallet = CryptoPayment::new(
                    required(&details.wallet_address, "wallet address")?,
                    required(&details.crypto_type, "crypto type")?,
                    self.config.crypto,
                )?;
                Ok(Box::new(wallet.with_latency(latency)))
            }
            other => Err(PaymentError::InvalidPayment(format!(
                "unsupported payment type: {other}"
            ))),
        }
    }
}

fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
    match field.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(PaymentError::Validation(format!("{name} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn factory() -> PaymentFactory {
        PaymentFactory::new(PaymentConfig::default())
    }

    #[test]
    fn test_sandbox_instruments() {
        let factory = factory();
        for method in factory.supported_types() {
            let payment = factory.create_or_sandbox(method, None).unwrap();
            assert_eq!(payment.payment_type(), method);
        }
    }

    #[test]
    fn test_unsupported_method() {
        let err = factory().create("cheque", &InstrumentDetails::default()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidPayment);
        let err = factory().create_or_sandbox("cheque", None).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidPayment);
        assert!(!factory().is_supported("cheque"));
    }

    #[test]
    fn test_missing_fields() {
        let details = InstrumentDetails {
            card_number: Some("4532015112830366".into()),
            ..InstrumentDetails::default()
        };
        let err = factory().create("credit_card", &details).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("card holder"));
    }

    #[test]
    fn test_explicit_details() {
        let details = InstrumentDetails {
            wallet_address: Some("0x742d35Cc6634C0532925a3b844Bc454e4438f44e".into()),
            crypto_type: Some("eth".into()),
            ..InstrumentDetails::default()
        };
        let payment = factory().create_or_sandbox("crypto", Some(&details)).unwrap();
        assert_eq!(payment.details()["crypto_type"], "ETH");
    }
}
