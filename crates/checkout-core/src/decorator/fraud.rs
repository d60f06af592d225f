use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use super::Adjustment;
use crate::error::{PaymentError, Result};

/// Source of the randomized parts of fraud screening
pub trait RandomSource: Send + Sync + std::fmt::Debug {
    /// Uniform value in `0..upper`
    fn next_below(&self, upper: u32) -> u32;
}

/// `StdRng` behind a mutex; seed it for reproducible runs
#[derive(Debug)]
pub struct StdRandom {
    rng: Mutex<StdRng>,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_below(&self, upper: u32) -> u32 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..upper),
            Err(poisoned) => poisoned.into_inner().gen_range(0..upper),
        }
    }
}

/// Timestamps of recent approved transactions, shared across decorators
#[derive(Debug, Default)]
pub struct VelocityWindow {
    timestamps: Mutex<VecDeque<Instant>>,
}

impl VelocityWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries older than `window` and return how many remain
    pub fn count_within(&self, window: Duration) -> usize {
        let now = Instant::now();
        let mut timestamps = match self.timestamps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        while timestamps
            .front()
            .is_some_and(|t| now.duration_since(*t) > window)
        {
            timestamps.pop_front();
        }
        timestamps.len()
    }

    pub fn record(&self) {
        let mut timestamps = match self.timestamps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        timestamps.push_back(Instant::now());
    }
}

/// Risk score, velocity and geolocation screening
#[derive(Debug)]
pub struct FraudDetection {
    max_risk_score: u32,
    max_transactions: usize,
    window: Duration,
    velocity: Arc<VelocityWindow>,
    random: Arc<dyn RandomSource>,
}

impl FraudDetection {
    const GEO_REJECT_PERCENT: u32 = 5;

    pub fn new(
        max_risk_score: u32,
        max_transactions: usize,
        window: Duration,
        velocity: Arc<VelocityWindow>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            max_risk_score,
            max_transactions,
            window,
            velocity,
            random,
        }
    }

    /// Amount thresholds plus a random 0..30 component
    pub fn risk_score(&self, amount: Decimal) -> u32 {
        let mut score = 0;
        if amount > Decimal::ONE_THOUSAND {
            score += 20;
        }
        if amount > Decimal::new(5000, 0) {
            score += 30;
        }
        score + self.random.next_below(30)
    }

    pub(super) fn screen(&self, amount: Decimal) -> Result<Adjustment> {
        let score = self.risk_score(amount);
        info!(risk_score = score, max_risk_score = self.max_risk_score, "Fraud risk calculated");
        if score > self.max_risk_score {
            warn!(risk_score = score, "Transaction blocked by risk score");
            return Err(PaymentError::FraudDetected(format!(
                "transaction blocked: high fraud risk (score: {score})"
            )));
        }

        let recent = self.velocity.count_within(self.window);
        if recent >= self.max_transactions {
            warn!(recent, limit = self.max_transactions, "Velocity check failed");
            return Err(PaymentError::FraudDetected(format!(
                "velocity check failed: {recent} transactions in the last {}s",
                self.window.as_secs()
            )));
        }

        if self.random.next_below(100) < Self::GEO_REJECT_PERCENT {
            warn!("Geolocation check failed");
            return Err(PaymentError::FraudDetected(
                "geolocation check failed: suspicious location".into(),
            ));
        }

        Ok(Adjustment::passthrough(amount)
            .fact("fraud_risk_score", score)
            .fact(
                "fraud_checks_passed",
                serde_json::json!(["risk_score", "velocity_check", "geolocation_check"]),
            ))
    }

    pub(super) fn record(&self) {
        self.velocity.record();
    }
}
