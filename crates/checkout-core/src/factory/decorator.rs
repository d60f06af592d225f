use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::config::DecoratorConfig;
use crate::customer::Customer;
use crate::decorator::{
    Cashback, Decorated, Discount, Feature, FraudDetection, LoyaltyPoints, RandomSource,
    StdRandom, Tax, VelocityWindow,
};
use crate::error::{PaymentError, Result};
use crate::options::CheckoutOptions;
use crate::payment::BoxedPayment;

/// Builds decorator chains from feature names.
///
/// One factory owns one velocity window, so every fraud decorator it builds
/// counts the same recent approvals.
#[derive(Debug)]
pub struct DecoratorFactory {
    config: DecoratorConfig,
    velocity: Arc<VelocityWindow>,
    random: Arc<dyn RandomSource>,
}

impl DecoratorFactory {
    const AVAILABLE: [&'static str; 5] = [
        "discount",
        "tax",
        "cashback",
        "fraud_detection",
        "loyalty_points",
    ];

    pub fn new(config: DecoratorConfig) -> Self {
        Self {
            config,
            velocity: Arc::new(VelocityWindow::new()),
            random: Arc::new(StdRandom::from_entropy()),
        }
    }

    /// Builder: replace the randomness used by fraud screening
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn available_decorators(&self) -> Vec<&'static str> {
        Self::AVAILABLE.to_vec()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        match name {
            "discount" => self.config.discount.enabled,
            "tax" => self.config.tax.enabled,
            "cashback" => self.config.cashback.enabled,
            "fraud_detection" => self.config.fraud_detection.enabled,
            "loyalty_points" => self.config.loyalty_points.enabled,
            _ => false,
        }
    }

    /// Wrap `payment` with the named features. The first name ends up
    /// outermost. Disabled or inapplicable features are skipped.
    pub fn apply(
        &self,
        payment: BoxedPayment,
        names: &[String],
        options: &CheckoutOptions,
        customer: Option<&Customer>,
    ) -> Result<BoxedPayment> {
        let mut features = Vec::with_capacity(names.len());
        for name in names {
            if let Some(feature) = self.feature(name, options, customer)? {
                features.push(feature);
            }
        }
        Ok(features.into_iter().rev().fold(payment, Decorated::wrap))
    }

    /// Build one feature, `None` when it should not be applied
    pub fn feature(
        &self,
        name: &str,
        options: &CheckoutOptions,
        customer: Option<&Customer>,
    ) -> Result<Option<Feature>> {
        if !Self::AVAILABLE.contains(&name) {
            return Err(PaymentError::Validation(format!("unsupported decorator: {name}")));
        }
        if !self.is_enabled(name) {
            debug!(decorator = name, "Decorator disabled, skipping");
            return Ok(None);
        }

        let feature = match name {
            "discount" => {
                let cfg = &self.config.discount;
                let mut discount = Discount::percentage(cfg.max_percentage)?
                    .with_max_discount(cfg.max_fixed_amount)
                    .with_min_amount(cfg.min_amount)
                    .expires_at(Utc::now() + ChronoDuration::days(cfg.validity_days));
                if let Some(code) = &options.discount_code {
                    discount = discount.with_code(code.as_str());
                }
                Feature::Discount(discount)
            }
            "tax" => {
                let cfg = &self.config.tax;
                let region = customer.map(Customer::tax_region).unwrap_or("DEFAULT");
                Feature::Tax(Tax::for_region(region, &cfg.rates, cfg.default_rate))
            }
            "cashback" => {
                let cfg = &self.config.cashback;
                Feature::Cashback(Cashback::new(
                    cfg.tier1_percentage,
                    cfg.tier2_percentage,
                    cfg.tier1_threshold,
                ))
            }
            "fraud_detection" => {
                let cfg = &self.config.fraud_detection;
                Feature::FraudDetection(FraudDetection::new(
                    cfg.max_risk_score,
                    cfg.max_transactions,
                    cfg.velocity_window(),
                    Arc::clone(&self.velocity),
                    Arc::clone(&self.random),
                ))
            }
            _ => {
                let Some(customer) = customer else {
                    debug!("No customer, skipping loyalty points");
                    return Ok(None);
                };
                if options.use_loyalty_points == 0 {
                    return Ok(None);
                }
                let cfg = &self.config.loyalty_points;
                Feature::LoyaltyPoints(LoyaltyPoints::new(
                    customer.loyalty_points,
                    options.use_loyalty_points,
                    cfg.points_to_currency_ratio,
                    cfg.max_redemption_percentage,
                )?)
            }
        };
        Ok(Some(feature))
    }
}
