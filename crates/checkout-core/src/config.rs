//! # Engine Configuration
//!
//! Everything the engine reads from `config/checkout.toml`. Every section has
//! defaults, so an empty file (or no file) yields a working configuration.
//!
//! ```toml
//! [payment]
//! timeout_secs = 30
//! retry_attempts = 3
//!
//! [decorators.tax.rates]
//! CA = 7.25
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{PaymentError, Result};
use crate::exchange::ExchangeRates;
use crate::payment::AmountLimits;

fn dec(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub payment: PaymentConfig,
    pub strategies: StrategyConfig,
    pub decorators: DecoratorConfig,
    pub notifications: NotificationConfig,
    pub metrics: MetricsConfig,
    pub exchange: ExchangeRates,
}

impl CheckoutConfig {
    /// Parse from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| PaymentError::Configuration(e.to_string()))
    }
}

/// Timeouts, retry policy, instrument limits and sandbox credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// Artificial gateway latency applied by every instrument
    pub simulated_latency_ms: u64,
    pub credit_card: AmountLimits,
    pub paypal: AmountLimits,
    pub crypto: AmountLimits,
    /// Instruments used when a checkout names a method but supplies no details
    pub sandbox: SandboxInstruments,
}

impl PaymentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            simulated_latency_ms: 0,
            credit_card: AmountLimits::new(dec(100), dec(1_000_000)),
            paypal: AmountLimits::new(dec(100), dec(500_000)),
            crypto: AmountLimits::new(dec(1_000), dec(5_000_000)),
            sandbox: SandboxInstruments::default(),
        }
    }
}

/// Raw instrument fields as supplied by a caller or by the sandbox config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentDetails {
    pub card_number: Option<String>,
    pub card_holder: Option<String>,
    pub expiry_date: Option<String>,
    pub cvv: Option<String>,
    pub paypal_email: Option<String>,
    pub paypal_password: Option<String>,
    pub wallet_address: Option<String>,
    pub crypto_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxInstruments {
    pub credit_card: InstrumentDetails,
    pub paypal: InstrumentDetails,
    pub crypto: InstrumentDetails,
}

impl SandboxInstruments {
    pub fn for_method(&self, method: &str) -> Option<&InstrumentDetails> {
        match method {
            "credit_card" => Some(&self.credit_card),
            "paypal" => Some(&self.paypal),
            "crypto" => Some(&self.crypto),
            _ => None,
        }
    }
}

impl Default for SandboxInstruments {
    fn default() -> Self {
        Self {
            credit_card: InstrumentDetails {
                card_number: Some("4532015112830366".into()),
                card_holder: Some("John Doe".into()),
                expiry_date: Some("12/30".into()),
                cvv: Some("123".into()),
                ..InstrumentDetails::default()
            },
            paypal: InstrumentDetails {
                paypal_email: Some("user@example.com".into()),
                paypal_password: Some("password".into()),
                ..InstrumentDetails::default()
            },
            crypto: InstrumentDetails {
                wallet_address: Some("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa".into()),
                crypto_type: Some("BTC".into()),
                ..InstrumentDetails::default()
            },
        }
    }
}

/// Strategy bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub instant: AmountLimits,
    pub deferred: DeferredConfig,
    pub split: SplitConfig,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            instant: AmountLimits::new(dec(100), dec(1_000_000)),
            deferred: DeferredConfig::default(),
            split: SplitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeferredConfig {
    pub limits: AmountLimits,
    pub installments: u32,
    pub interest_rate: Decimal,
    pub min_installments: u32,
    pub max_installments: u32,
}

impl Default for DeferredConfig {
    fn default() -> Self {
        Self {
            limits: AmountLimits::new(dec(10_000), dec(1_000_000)),
            installments: 3,
            interest_rate: Decimal::ZERO,
            min_installments: 2,
            max_installments: 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub max_parts: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { max_parts: 5 }
    }
}

/// Per-decorator switches and parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoratorConfig {
    pub discount: DiscountConfig,
    pub tax: TaxConfig,
    pub cashback: CashbackConfig,
    pub fraud_detection: FraudConfig,
    pub loyalty_points: LoyaltyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountConfig {
    pub enabled: bool,
    /// Percentage applied to coupon checkouts
    pub max_percentage: Decimal,
    /// Upper bound on any single discount
    pub max_fixed_amount: Decimal,
    pub min_amount: Decimal,
    /// Days a freshly issued coupon stays valid
    pub validity_days: i64,
}

impl Default for DiscountConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_percentage: Decimal::TEN,
            max_fixed_amount: Decimal::ONE_HUNDRED,
            min_amount: Decimal::ZERO,
            validity_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    pub enabled: bool,
    pub default_rate: Decimal,
    /// Region key (address state) to percentage
    pub rates: HashMap<String, Decimal>,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_rate: Decimal::TEN,
            rates: HashMap::from([
                ("CA".to_string(), dec(725)),
                ("NY".to_string(), Decimal::new(8875, 3)),
                ("TX".to_string(), dec(625)),
                ("DEFAULT".to_string(), Decimal::TEN),
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CashbackConfig {
    pub enabled: bool,
    pub tier1_percentage: Decimal,
    pub tier2_percentage: Decimal,
    pub tier1_threshold: Decimal,
}

impl Default for CashbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tier1_percentage: Decimal::ONE,
            tier2_percentage: Decimal::TWO,
            tier1_threshold: Decimal::new(500, 0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudConfig {
    pub enabled: bool,
    pub max_risk_score: u32,
    pub velocity_window_secs: u64,
    pub max_transactions: usize,
}

impl FraudConfig {
    pub fn velocity_window(&self) -> Duration {
        Duration::from_secs(self.velocity_window_secs)
    }
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_risk_score: 70,
            velocity_window_secs: 3600,
            max_transactions: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoyaltyConfig {
    pub enabled: bool,
    /// Points per one unit of currency
    pub points_to_currency_ratio: Decimal,
    pub max_redemption_percentage: Decimal,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            points_to_currency_ratio: Decimal::ONE_HUNDRED,
            max_redemption_percentage: Decimal::new(50, 0),
        }
    }
}

/// Observer settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub email: EmailConfig,
    pub sms: SmsConfig,
    pub webhook: WebhookConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub queue_size: usize,
    pub workers: usize,
    pub from_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_size: 100,
            workers: 3,
            from_address: "noreply@checkout.local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub enabled: bool,
    /// Messages per rolling minute
    pub rate_limit: usize,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub retry_backoff_ms: u64,
    /// HMAC-SHA256 signing secret; unsigned when absent
    pub secret: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            max_retries: 3,
            timeout_secs: 10,
            retry_backoff_ms: 1000,
            secret: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "data/audit.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub export_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            export_interval_secs: 60,
        }
    }
}
