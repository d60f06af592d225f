use async_trait::async_trait;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use super::{authorize, AmountLimits, Payment, PaymentResult};
use crate::context::CheckoutContext;
use crate::error::{PaymentError, Result};
use crate::money::Currency;

static BTC_LEGACY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[13][a-km-zA-HJ-NP-Z1-9]{25,34}$").expect("btc legacy regex")
});
static BTC_BECH32: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bc1[a-z0-9]{39,59}$").expect("btc bech32 regex"));
static EVM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("evm address regex"));

/// Accepted crypto assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CryptoType {
    BTC,
    ETH,
    USDT,
}

impl CryptoType {
    pub fn currency(&self) -> Currency {
        match self {
            CryptoType::BTC => Currency::BTC,
            CryptoType::ETH => Currency::ETH,
            CryptoType::USDT => Currency::USDT,
        }
    }

    /// Check an address against this asset's format
    pub fn validate_address(&self, address: &str) -> Result<()> {
        let valid = match self {
            CryptoType::BTC => {
                (BTC_LEGACY.is_match(address) && (26..=35).contains(&address.len()))
                    || BTC_BECH32.is_match(address)
            }
            CryptoType::ETH | CryptoType::USDT => EVM.is_match(address),
        };
        if valid {
            Ok(())
        } else {
            Err(PaymentError::Validation(format!(
                "invalid {} wallet address",
                self.currency()
            )))
        }
    }
}

impl FromStr for CryptoType {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "BTC" => Ok(CryptoType::BTC),
            "ETH" => Ok(CryptoType::ETH),
            "USDT" => Ok(CryptoType::USDT),
            other => Err(PaymentError::Validation(format!(
                "unsupported crypto type: {other}"
            ))),
        }
    }
}

/// Crypto wallet instrument
#[derive(Debug, Clone)]
pub struct CryptoPayment {
    wallet_address: String,
    crypto_type: CryptoType,
    limits: AmountLimits,
    latency: Duration,
}

impl CryptoPayment {
    pub const TYPE: &'static str = "crypto";

    /// Validate and build a wallet. `crypto_type` is case-insensitive.
    pub fn new(wallet_address: &str, crypto_type: &str, limits: AmountLimits) -> Result<Self> {
        if wallet_address.is_empty() {
            return Err(PaymentError::Validation("wallet address is required".into()));
        }
        let crypto_type: CryptoType = crypto_type.parse()?;
        crypto_type.validate_address(wallet_address)?;

        Ok(Self {
            wallet_address: wallet_address.to_string(),
            crypto_type,
            limits,
            latency: Duration::ZERO,
        })
    }

    /// Builder: simulated confirmation latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn crypto_type(&self) -> CryptoType {
        self.crypto_type
    }

    /// First 6 and last 4 characters; anything shorter than 10 is fully hidden
    pub fn masked_address(&self) -> String {
        let addr = &self.wallet_address;
        if addr.len() < 10 {
            return "****".to_string();
        }
        format!("{}****{}", &addr[..6], &addr[addr.len() - 4..])
    }
}

#[async_trait]
impl Payment for CryptoPayment {
    async fn process(&self, ctx: &CheckoutContext, amount: Decimal) -> Result<PaymentResult> {
        authorize(ctx, &self.limits, self.latency, amount).await?;

        debug!(wallet = %self.masked_address(), crypto = ?self.crypto_type, %amount, "Charging wallet");
        let mut result = PaymentResult::approved(Self::TYPE, amount, self.crypto_type.currency())
            .with_message(format!("{} payment processed successfully", self.crypto_type.currency()));
        let tx_prefix: String = result.transaction_id.chars().filter(|c| *c != '-').take(16).collect();
        result.insert_meta("blockchain_tx", format!("0x{tx_prefix}"));
        result.insert_meta("crypto_type", self.crypto_type.currency().as_str());
        result.insert_meta("wallet_address", self.masked_address());
        Ok(result)
    }

    fn payment_type(&self) -> &str {
        Self::TYPE
    }

    fn details(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("wallet_address".to_string(), self.masked_address()),
            ("crypto_type".to_string(), self.crypto_type.currency().to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const BTC_ADDR: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
    const ETH_ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    fn limits() -> AmountLimits {
        AmountLimits::new(dec!(10), dec!(50000))
    }

    #[tokio::test]
    async fn test_btc_payment() {
        let wallet = CryptoPayment::new(BTC_ADDR, "btc", limits()).unwrap();
        let result = wallet.process(&CheckoutContext::new(), dec!(120)).await.unwrap();

        assert_eq!(result.currency, Currency::BTC);
        assert_eq!(result.processed_amount, dec!(120));
        let tx = result.metadata["blockchain_tx"].as_str().unwrap();
        assert!(tx.starts_with("0x"));
        assert_eq!(tx.len(), 18);
    }

    #[tokio::test]
    async fn test_below_minimum() {
        let wallet = CryptoPayment::new(ETH_ADDR, "ETH", limits()).unwrap();
        assert!(wallet.process(&CheckoutContext::new(), dec!(9.99)).await.is_err());
    }

    #[test]
    fn test_address_formats() {
        assert!(CryptoPayment::new(ETH_ADDR, "usdt", limits()).is_ok());
        assert!(CryptoPayment::new(
            "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdqar0srrr7xfkvy5l6",
            "BTC",
            limits()
        )
        .is_ok());
        assert!(CryptoPayment::new(ETH_ADDR, "BTC", limits()).is_err());
        assert!(CryptoPayment::new(BTC_ADDR, "ETH", limits()).is_err());
        assert!(CryptoPayment::new(BTC_ADDR, "DOGE", limits()).is_err());
        assert!(CryptoPayment::new("", "BTC", limits()).is_err());
    }

    #[test]
    fn test_masked_address() {
        let wallet = CryptoPayment::new(BTC_ADDR, "BTC", limits()).unwrap();
        assert_eq!(wallet.masked_address(), "1A1zP1****vfNa");
        assert_eq!(wallet.details()["crypto_type"], "BTC");
    }
}
