//! # Payment Strategy Trait
//!
//! A strategy decides *how* a (possibly decorated) payment is executed: once,
//! as the first installment of a schedule, or split across several
//! instruments.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PaymentStrategy (trait)                  │
//! │  ├── execute(ctx, payment, amount)                          │
//! │  └── name()                                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!          ┌─────────────────┼─────────────────┐
//!          │                 │                 │
//!  ┌───────┴───────┐ ┌───────┴───────┐ ┌───────┴───────┐
//!  │    Instant    │ │   Deferred    │ │     Split     │
//!  │  one charge   │ │ 1st of N inst.│ │ N instruments │
//!  └───────────────┘ └───────────────┘ └───────────────┘
//! ```
//!
//! Strategies hold configuration only; nothing carries over between calls.

mod deferred;
mod instant;
mod split;

pub use deferred::{DeferredStrategy, Installment, InstallmentSchedule};
pub use instant::InstantStrategy;
pub use split::{SplitPart, SplitStrategy};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::context::CheckoutContext;
use crate::error::Result;
use crate::payment::{Payment, PaymentResult};

/// Execution policy for a payment.
#[async_trait]
pub trait PaymentStrategy: Send + Sync {
    /// Run the payment for `amount`.
    ///
    /// Split strategies carry their own instruments and ignore `payment`.
    async fn execute(
        &self,
        ctx: &CheckoutContext,
        payment: &dyn Payment,
        amount: Decimal,
    ) -> Result<PaymentResult>;

    /// Strategy name (for logging and receipts), e.g. `deferred_3_installments`
    fn name(&self) -> &str;
}

/// Type alias for an owned strategy
pub type BoxedStrategy = Box<dyn PaymentStrategy>;
