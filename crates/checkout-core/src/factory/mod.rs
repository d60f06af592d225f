//! # Factories
//!
//! Build payments, decorator chains and strategies from the string names a
//! caller sends, validating that each name is supported and enabled.

mod decorator;
mod payment;
mod strategy;

pub use decorator::DecoratorFactory;
pub use payment::PaymentFactory;
pub use strategy::StrategyFactory;
