use crate::config::StrategyConfig;
use crate::error::{PaymentError, Result};
use crate::options::CheckoutOptions;
use crate::strategy::{BoxedStrategy, DeferredStrategy, InstantStrategy, SplitPart, SplitStrategy};

/// Builds strategies by name
#[derive(Debug, Clone)]
pub struct StrategyFactory {
    config: StrategyConfig,
}

impl StrategyFactory {
    const SUPPORTED: [&'static str; 3] = ["instant", "deferred", "split"];

    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    pub fn is_supported(&self, name: &str) -> bool {
        Self::SUPPORTED.contains(&name)
    }

    pub fn supported_strategies(&self) -> Vec<&'static str> {
        Self::SUPPORTED.to_vec()
    }

    /// Build `instant` or `deferred`. Split needs its instruments up front,
    /// use [`create_split`](Self::create_split) for it.
    pub fn create(&self, name: &str, options: &CheckoutOptions) -> Result<BoxedStrategy> {
        match name {
            InstantStrategy::NAME => Ok(Box::new(InstantStrategy::new(self.config.instant))),
            "deferred" => {
                let cfg = &self.config.deferred;
                let installments = options.installments.unwrap_or(cfg.installments);
                Ok(Box::new(DeferredStrategy::with_bounds(
                    cfg.limits,
                    installments,
                    cfg.interest_rate,
                    cfg.min_installments,
                    cfg.max_installments,
                )?))
            }
            "split" => Err(PaymentError::Validation(
                "split strategy requires payment parts".into(),
            )),
            other => Err(PaymentError::Validation(format!("unsupported strategy: {other}"))),
        }
    }

    pub fn create_split(&self, parts: Vec<SplitPart>) -> Result<BoxedStrategy> {
        Ok(Box::new(SplitStrategy::with_max_parts(
            parts,
            self.config.split.max_parts,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::payment::testing::RecordingPayment;
    use rust_decimal_macros::dec;

    fn factory() -> StrategyFactory {
        StrategyFactory::new(StrategyConfig::default())
    }

    #[test]
    fn test_create_by_name() {
        let options = CheckoutOptions::new("paypal");
        assert_eq!(factory().create("instant", &options).unwrap().name(), "instant");
        assert_eq!(
            factory().create("deferred", &options).unwrap().name(),
            "deferred_3_installments"
        );
        assert_eq!(
            factory()
                .create("deferred", &CheckoutOptions { installments: Some(6), ..options })
                .unwrap()
                .name(),
            "deferred_6_installments"
        );
    }

    #[test]
    fn test_rejections() {
        let options = CheckoutOptions::new("paypal");
        let err = factory().create("layaway", &options).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(factory().create("split", &options).is_err());
        assert!(factory()
            .create("deferred", &CheckoutOptions { installments: Some(24), ..options })
            .is_err());
        assert!(!factory().is_supported("layaway"));
    }

    #[test]
    fn test_split_respects_configured_max() {
        let mut config = StrategyConfig::default();
        config.split.max_parts = 2;
        let factory = StrategyFactory::new(config);
        let parts = (0..3)
            .map(|_| SplitPart::new(Box::new(RecordingPayment::default()), dec!(10)))
            .collect();
        assert!(factory.create_split(parts).is_err());
    }
}
