//! # checkout-core
//!
//! Checkout orchestration engine: composable payments, pricing decorators,
//! execution strategies and lifecycle events.
//!
//! This crate provides:
//! - `Payment` trait with card, PayPal and crypto instruments
//! - Decorator chain (discount, tax, cashback, fraud screening, loyalty points)
//! - `PaymentStrategy` trait with instant, deferred and split execution
//! - `CheckoutFacade` running validate → reserve → charge → receipt with retries
//! - `EventSubject` fanning lifecycle events out to observers
//! - `Repository` trait with in-memory and JSON-file backends
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{
//!     Catalog, CheckoutConfig, CheckoutContext, CheckoutFacade, CheckoutOptions,
//!     EventSubject, InMemoryRepository,
//! };
//! use std::sync::Arc;
//!
//! let repo = Arc::new(InMemoryRepository::with_catalog(&Catalog::demo()));
//! let facade = CheckoutFacade::new(CheckoutConfig::default(), repo, Arc::new(EventSubject::new()));
//!
//! facade.carts().add_item("cust-1", "prod-2", 2).await?;
//!
//! let options = CheckoutOptions::new("credit_card")
//!     .with_decorator("tax")
//!     .with_decorator("discount");
//! let receipt = facade.checkout(&CheckoutContext::new(), "cust-1", &options).await?;
//! ```

pub mod cart;
pub mod checkout;
pub mod config;
pub mod context;
pub mod customer;
pub mod decorator;
pub mod error;
pub mod event;
pub mod exchange;
pub mod factory;
pub mod money;
pub mod options;
pub mod payment;
pub mod product;
pub mod repository;
pub mod service;
pub mod strategy;
pub mod transaction;
pub mod validator;

// Re-exports for convenience
pub use cart::{Cart, CartItem};
pub use checkout::CheckoutFacade;
pub use config::{CheckoutConfig, InstrumentDetails};
pub use context::CheckoutContext;
pub use customer::{Address, Customer};
pub use error::{ErrorKind, PaymentError, Result};
pub use event::{Event, EventSubject, EventType, Observer};
pub use exchange::{DebitQuote, ExchangeRates};
pub use factory::{DecoratorFactory, PaymentFactory, StrategyFactory};
pub use money::{round_money, Currency};
pub use options::{CheckoutOptions, SplitPartRequest};
pub use payment::{BoxedPayment, Payment, PaymentResult, SharedPayment};
pub use product::{Catalog, Product};
pub use repository::{InMemoryRepository, JsonFileRepository, Repository, SharedRepository};
pub use strategy::{BoxedStrategy, PaymentStrategy};
pub use transaction::{Receipt, ReceiptItem, Transaction, TransactionStatus};
