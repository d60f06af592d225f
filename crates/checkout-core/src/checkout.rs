//! # Checkout Facade
//!
//! [`CheckoutFacade::process_order`] drives one cart through the whole
//! pipeline:
//!
//! ```text
//! started ─▶ validate stock ─▶ reserve stock ─▶ build payment ─▶ decorate
//!                                                                   │
//!        failed ◀── release stock ◀── (any error) ◀── execute strategy (retry)
//!                                                                   │
//!                                                                   ▼
//!                         success ◀── receipt ◀── persist ◀── loyalty, clear cart
//! ```
//!
//! Every failure is wrapped as `PaymentFailed` with the stage it happened in;
//! the inner kind stays reachable through [`PaymentError::has_kind`].
//!
//! Events are delivered on detached tasks. The terminal event of a checkout
//! waits for its `started` delivery, so observers see them in order.

use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::cart::Cart;
use crate::config::CheckoutConfig;
use crate::context::CheckoutContext;
use crate::customer::Customer;
use crate::error::{ErrorKind, PaymentError, Result};
use crate::event::{Event, EventSubject, EventType};
use crate::factory::{DecoratorFactory, PaymentFactory, StrategyFactory};
use crate::options::CheckoutOptions;
use crate::payment::{Payment, PaymentResult, SharedPayment};
use crate::product::Product;
use crate::repository::SharedRepository;
use crate::service::{CartService, CustomerService, InventoryService, TransactionService};
use crate::strategy::{BoxedStrategy, PaymentStrategy, SplitPart};
use crate::transaction::{Receipt, Transaction};

/// Single entry point for checkouts
pub struct CheckoutFacade {
    config: CheckoutConfig,
    repo: SharedRepository,
    payments: PaymentFactory,
    decorators: DecoratorFactory,
    strategies: StrategyFactory,
    inventory: InventoryService,
    customers: CustomerService,
    carts: CartService,
    transactions: TransactionService,
    events: Arc<EventSubject>,
}

impl CheckoutFacade {
    pub fn new(config: CheckoutConfig, repo: SharedRepository, events: Arc<EventSubject>) -> Self {
        Self {
            payments: PaymentFactory::new(config.payment.clone()),
            decorators: DecoratorFactory::new(config.decorators.clone()),
            strategies: StrategyFactory::new(config.strategies.clone()),
            inventory: InventoryService::new(Arc::clone(&repo)),
            customers: CustomerService::new(Arc::clone(&repo)),
            carts: CartService::new(Arc::clone(&repo)),
            transactions: TransactionService::new(Arc::clone(&repo)),
            repo,
            events,
            config,
        }
    }

    /// Builder: replace the decorator factory (e.g. one with seeded randomness)
    pub fn with_decorator_factory(mut self, decorators: DecoratorFactory) -> Self {
        self.decorators = decorators;
        self
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn repository(&self) -> &SharedRepository {
        &self.repo
    }

    pub fn events(&self) -> &Arc<EventSubject> {
        &self.events
    }

    pub fn payment_factory(&self) -> &PaymentFactory {
        &self.payments
    }

    pub fn decorator_factory(&self) -> &DecoratorFactory {
        &self.decorators
    }

    pub fn strategy_factory(&self) -> &StrategyFactory {
        &self.strategies
    }

    pub fn customers(&self) -> &CustomerService {
        &self.customers
    }

    pub fn carts(&self) -> &CartService {
        &self.carts
    }

    pub fn inventory(&self) -> &InventoryService {
        &self.inventory
    }

    /// Load the customer and their stored cart, then run [`process_order`](Self::process_order)
    pub async fn checkout(
        &self,
        ctx: &CheckoutContext,
        customer_id: &str,
        options: &CheckoutOptions,
    ) -> Result<Receipt> {
        let customer = self.customers.get(customer_id).await?;
        let mut cart = self.carts.get_or_create_cart(customer_id).await?;
        self.process_order(ctx, &mut cart, &customer, options).await
    }

    /// Newest first
    pub async fn transaction_history(
        &self,
        customer_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        self.transactions.history(customer_id, limit, offset).await
    }

    /// Charge `cart` for `customer`. On success the cart is emptied (and the
    /// stored copy too, if there is one).
    #[instrument(skip_all, fields(customer_id = %customer.id, cart_id = %cart.id))]
    pub async fn process_order(
        &self,
        ctx: &CheckoutContext,
        cart: &mut Cart,
        customer: &Customer,
        options: &CheckoutOptions,
    ) -> Result<Receipt> {
        let amount = cart.total();
        let mut transaction = Transaction::new(&customer.id, amount, &options.payment_method);
        info!(transaction_id = %transaction.id, %amount, "Starting checkout");

        let started = self.emit(
            Event::new(
                EventType::PaymentStarted,
                &transaction.id,
                &customer.id,
                amount,
                &options.payment_method,
            )
            .with_metadata(options.metadata.clone()),
            None,
        );

        let products = match self.validate_inventory(cart).await {
            Ok(products) => products,
            Err(e) => return Err(self.fail(transaction, options, e, started).await),
        };
        if let Err(e) = self.reserve_inventory(cart).await {
            return Err(self.fail(transaction, options, e, started).await);
        }

        transaction.mark_processing();
        let result = match self.charge(ctx, amount, customer, options).await {
            Ok(result) => result,
            Err(e) => {
                self.release_inventory(cart).await;
                return Err(self.fail(transaction, options, e, started).await);
            }
        };

        transaction.mark_completed(&result);
        self.update_loyalty(customer, &result).await;

        let receipt = Receipt::build(&transaction, customer, cart, &products, &result);
        cart.clear();
        match self.repo.update_cart(cart.clone()).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "Failed to clear stored cart"),
        }
        if let Err(e) = self.transactions.record(transaction.clone()).await {
            error!(transaction_id = %transaction.id, error = %e, "Failed to save transaction");
        }

        self.emit(
            Event::new(
                EventType::PaymentSuccess,
                &transaction.id,
                &customer.id,
                result.amount,
                &result.payment_method,
            )
            .with_result(result.clone())
            .with_metadata(options.metadata.clone()),
            Some(started),
        );

        info!(
            transaction_id = %transaction.id,
            amount = %result.amount,
            decorators = ?result.applied_decorators,
            "Checkout completed"
        );
        Ok(receipt)
    }

    /// Build, decorate and execute the payment
    async fn charge(
        &self,
        ctx: &CheckoutContext,
        amount: Decimal,
        customer: &Customer,
        options: &CheckoutOptions,
    ) -> Result<PaymentResult> {
        let (payment, strategy) = if options.strategy == "split" {
            self.split_payment(options)?
        } else {
            let payment = self
                .payments
                .create_or_sandbox(&options.payment_method, options.payment_details.as_ref())
                .map_err(|e| stage(e, "payment creation failed"))?;
            let payment: SharedPayment = self
                .decorators
                .apply(payment, &options.decorators, options, Some(customer))
                .map_err(|e| stage(e, "decorator application failed"))?
                .into();
            let strategy = self
                .strategies
                .create(&options.strategy, options)
                .map_err(|e| stage(e, "payment processing failed"))?;
            (payment, strategy)
        };

        debug!(strategy = strategy.name(), details = ?payment.details(), "Executing payment");
        self.execute_with_retry(ctx, strategy.as_ref(), payment.as_ref(), amount)
            .await
            .map_err(|e| stage(e, "payment processing failed"))
    }

    /// Split payments carry their own instruments and take no decorators
    fn split_payment(&self, options: &CheckoutOptions) -> Result<(SharedPayment, BoxedStrategy)> {
        if !options.decorators.is_empty() {
            return Err(stage(
                PaymentError::Validation("decorators are not supported with split payments".into()),
                "decorator application failed",
            ));
        }

        let parts = options
            .split_parts
            .iter()
            .map(|p| {
                let payment = self
                    .payments
                    .create_or_sandbox(&p.payment_method, p.details.as_ref())
                    .map_err(|e| stage(e, "payment creation failed"))?;
                Ok(SplitPart::new(payment, p.amount))
            })
            .collect::<Result<Vec<_>>>()?;
        let first = parts.first().map(|p| Arc::clone(&p.payment));

        let strategy = self
            .strategies
            .create_split(parts)
            .map_err(|e| stage(e, "payment processing failed"))?;
        let first = first.ok_or_else(|| {
            stage(
                PaymentError::Validation("split payment requires at least one payment method".into()),
                "payment processing failed",
            )
        })?;
        Ok((first, strategy))
    }

    /// Run `strategy` under the configured timeout, retrying retryable failures.
    ///
    /// All attempts share one deadline. Fraud, invalid-payment and timeout
    /// failures end the loop at once.
    pub(crate) async fn execute_with_retry(
        &self,
        ctx: &CheckoutContext,
        strategy: &dyn PaymentStrategy,
        payment: &dyn Payment,
        amount: Decimal,
    ) -> Result<PaymentResult> {
        let cfg = &self.config.payment;
        let exec_ctx = ctx.child_with_timeout(cfg.timeout());
        let mut attempt = 0;

        loop {
            exec_ctx.check()?;
            let left = exec_ctx.remaining().unwrap_or_else(|| cfg.timeout());
            let outcome = tokio::time::timeout(left, strategy.execute(&exec_ctx, payment, amount))
                .await
                .unwrap_or_else(|_| {
                    Err(PaymentError::Timeout(format!(
                        "payment timed out after {}s",
                        cfg.timeout_secs
                    )))
                });

            let err = match outcome {
                Ok(result) => return Ok(result),
                Err(e) => e,
            };
            if !err.is_retryable() || attempt >= cfg.retry_attempts {
                return Err(err);
            }

            attempt += 1;
            warn!(attempt, max_retries = cfg.retry_attempts, error = %err, "Payment attempt failed, retrying");
            exec_ctx.sleep(cfg.retry_delay()).await?;
        }
    }

    async fn validate_inventory(&self, cart: &Cart) -> Result<Vec<Product>> {
        if cart.is_empty() {
            return Err(stage(
                PaymentError::Validation("cart is empty".into()),
                "inventory validation failed",
            ));
        }

        let mut products = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let product = self
                .repo
                .get_product(&item.product_id)
                .await
                .map_err(|e| stage(e, "inventory validation failed"))?;
            if !product.in_stock(item.quantity) {
                return Err(stage(
                    PaymentError::Inventory(format!(
                        "insufficient inventory for product {}",
                        product.name
                    )),
                    "inventory validation failed",
                ));
            }
            products.push(product);
        }
        Ok(products)
    }

    /// Reserve every line in order.
    ///
    /// Lines reserved before a failing one stay reserved.
    async fn reserve_inventory(&self, cart: &Cart) -> Result<()> {
        for item in &cart.items {
            self.inventory
                .reserve_stock(&item.product_id, item.quantity)
                .await
                .map_err(|e| stage(e, "inventory reservation failed"))?;
        }
        Ok(())
    }

    async fn release_inventory(&self, cart: &Cart) {
        warn!(items = cart.items.len(), "Rolling back inventory reservations");
        for item in &cart.items {
            if let Err(e) = self.inventory.release_stock(&item.product_id, item.quantity).await {
                error!(product_id = %item.product_id, error = %e, "Failed to roll back inventory");
            }
        }
    }

    async fn update_loyalty(&self, customer: &Customer, result: &PaymentResult) {
        let earned = result.meta_u64("loyalty_points_earned").unwrap_or(0);
        let redeemed = result.meta_u64("loyalty_points_redeemed").unwrap_or(0);
        if earned == 0 && redeemed == 0 {
            return;
        }
        if let Err(e) = self
            .customers
            .update_loyalty_points(&customer.id, earned, redeemed)
            .await
        {
            warn!(customer_id = %customer.id, error = %e, "Failed to update loyalty points");
        }
    }

    /// Record the failure, emit `failed` and hand the error back
    async fn fail(
        &self,
        mut transaction: Transaction,
        options: &CheckoutOptions,
        err: PaymentError,
        started: JoinHandle<()>,
    ) -> PaymentError {
        error!(transaction_id = %transaction.id, error = %err, "Checkout failed");
        transaction.mark_failed(err.to_string());
        if let Err(e) = self.transactions.record(transaction.clone()).await {
            error!(transaction_id = %transaction.id, error = %e, "Failed to save transaction");
        }

        self.emit(
            Event::new(
                EventType::PaymentFailed,
                &transaction.id,
                &transaction.customer_id,
                transaction.amount,
                &transaction.payment_method,
            )
            .with_error(err.to_string())
            .with_metadata(options.metadata.clone()),
            Some(started),
        );
        err
    }

    /// Deliver `event` on a detached task, after `after` has finished
    fn emit(&self, event: Event, after: Option<JoinHandle<()>>) -> JoinHandle<()> {
        let events = Arc::clone(&self.events);
        tokio::spawn(async move {
            if let Some(previous) = after {
                if let Err(e) = previous.await {
                    error!(error = %e, "Event delivery task failed");
                }
            }
            events.notify(Arc::new(event)).await;
        })
    }
}

fn stage(err: PaymentError, context: &str) -> PaymentError {
    PaymentError::wrap(err, ErrorKind::PaymentFailed, context)
}

impl std::fmt::Debug for CheckoutFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFacade")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoratorConfig;
    use crate::customer::Address;
    use crate::decorator::ScriptedRandom;
    use crate::event::tests::CollectingObserver;
    use crate::payment::testing::RecordingPayment;
    use crate::product::Catalog;
    use crate::repository::{InMemoryRepository, Repository};
    use crate::strategy::InstantStrategy;
    use crate::transaction::TransactionStatus;
    use crate::payment::AmountLimits;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    const WIDGET: &str = "widget";

    fn catalog() -> Catalog {
        let mut catalog = Catalog::demo();
        catalog
            .products
            .push(Product::new(WIDGET, "Widget", dec!(100), "WID-001", 5));
        catalog.customers.push(
            Customer::new("plain@example.com", "Plain")
                .with_address(Address::default())
                .with_loyalty_points(500),
        );
        catalog
    }

    struct Harness {
        facade: CheckoutFacade,
        repo: Arc<InMemoryRepository>,
        observer: Arc<CollectingObserver>,
        customer: Customer,
    }

    fn harness_with(config: CheckoutConfig, random: &[u32]) -> Harness {
        let catalog = catalog();
        let customer = catalog.customers[1].clone();
        let repo = Arc::new(InMemoryRepository::with_catalog(&catalog));
        let events = Arc::new(EventSubject::new());
        let observer = CollectingObserver::named("collector");
        events.attach(observer.clone());

        let decorators = DecoratorFactory::new(config.decorators.clone())
            .with_random(ScriptedRandom::new(random));
        let facade = CheckoutFacade::new(config, repo.clone(), events).with_decorator_factory(decorators);
        Harness {
            facade,
            repo,
            observer,
            customer,
        }
    }

    fn harness() -> Harness {
        let mut config = CheckoutConfig::default();
        config.payment.retry_delay_ms = 10;
        harness_with(config, &[0, 99])
    }

    fn widget_cart(customer: &Customer, quantity: u32) -> Cart {
        let mut cart = Cart::new(&customer.id);
        cart.add_product(&Product::new(WIDGET, "Widget", dec!(100), "WID-001", 5), quantity);
        cart
    }

    async fn wait_for_events(observer: &CollectingObserver, count: usize) -> Vec<EventType> {
        for _ in 0..100 {
            if observer.types().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        observer.types()
    }

    #[tokio::test]
    async fn test_tax_then_discount_receipt() {
        let h = harness();
        let mut cart = widget_cart(&h.customer, 1);
        let options = CheckoutOptions::new("credit_card")
            .with_decorator("tax")
            .with_decorator("discount");

        let receipt = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &options)
            .await
            .unwrap();

        assert_eq!(receipt.total, dec!(99));
        assert_eq!(receipt.subtotal, dec!(100));
        assert_eq!(receipt.tax, dec!(10));
        assert_eq!(receipt.discount, dec!(11));
        assert_eq!(receipt.applied_decorators, vec!["discount", "tax"]);
        assert_eq!(receipt.items[0].sku, "WID-001");
        assert!(cart.is_empty());
        assert_eq!(h.repo.get_product(WIDGET).await.unwrap().stock, 4);

        let history = h.facade.transaction_history(&h.customer.id, 10, 0).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, TransactionStatus::Completed);
        assert_eq!(history[0].amount, dec!(99));

        let events = wait_for_events(&h.observer, 2).await;
        assert_eq!(events, vec![EventType::PaymentStarted, EventType::PaymentSuccess]);
    }

    #[tokio::test]
    async fn test_stock_shortfall_mutates_nothing() {
        let h = harness();
        let mut cart = widget_cart(&h.customer, 6);

        let err = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &CheckoutOptions::new("paypal"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PaymentFailed);
        assert!(err.has_kind(ErrorKind::Inventory));
        assert!(err.to_string().contains("inventory validation failed"));
        assert_eq!(h.repo.get_product(WIDGET).await.unwrap().stock, 5);
        assert_eq!(cart.item_count(), 6);

        let history = h.facade.transaction_history(&h.customer.id, 10, 0).await.unwrap();
        assert_eq!(history[0].status, TransactionStatus::Failed);
        assert!(history[0].error_message.is_some());

        let events = wait_for_events(&h.observer, 2).await;
        assert_eq!(events, vec![EventType::PaymentStarted, EventType::PaymentFailed]);
    }

    #[tokio::test]
    async fn test_unknown_decorator_releases_stock() {
        let h = harness();
        let mut cart = widget_cart(&h.customer, 2);
        let options = CheckoutOptions::new("paypal").with_decorator("gift_wrap");

        let err = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &options)
            .await
            .unwrap_err();

        assert_eq!(err.root_kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("decorator application failed"));
        assert_eq!(h.repo.get_product(WIDGET).await.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_reservation_failure_keeps_earlier_lines() {
        let h = harness();
        // Each line passes the availability check alone; together they exceed stock
        let mut cart = widget_cart(&h.customer, 3);
        let line = cart.items[0].clone();
        cart.items.push(line);

        let err = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &CheckoutOptions::new("paypal"))
            .await
            .unwrap_err();

        assert_eq!(err.root_kind(), ErrorKind::Inventory);
        // The first line's reservation is not rolled back
        assert_eq!(h.repo.get_product(WIDGET).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_failed_event_carries_metadata() {
        let h = harness();
        let mut cart = widget_cart(&h.customer, 6);
        let options = CheckoutOptions::new("paypal").with_metadata("customer_email", "ann@example.com");

        let err = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &options)
            .await
            .unwrap_err();
        assert_eq!(err.root_kind(), ErrorKind::Inventory);

        let events = wait_for_events(&h.observer, 2).await;
        assert_eq!(events, vec![EventType::PaymentStarted, EventType::PaymentFailed]);
        let collected = h.observer.events.lock().unwrap();
        let failed = &collected[1];
        assert_eq!(
            failed.metadata.get("customer_email").map(String::as_str),
            Some("ann@example.com")
        );
        assert!(failed.error.is_some());
    }

    #[tokio::test]
    async fn test_fraud_rejection_is_not_retried() {
        let h = harness_with(CheckoutConfig::default(), &[29]);
        let mut cart = Cart::new(&h.customer.id);
        cart.add_product(&h.repo.get_product("prod-5").await.unwrap(), 15);
        let options = CheckoutOptions::new("crypto").with_decorator("fraud_detection");

        // 15 × 399.99 > 5000 → 20 + 30 + 29 = 79 > 70
        let err = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &options)
            .await
            .unwrap_err();

        assert!(err.has_kind(ErrorKind::FraudDetected));
        assert_eq!(err.status_code(), 403);
        assert_eq!(h.repo.get_product("prod-5").await.unwrap().stock, 15);
    }

    #[tokio::test]
    async fn test_loyalty_balance_updated() {
        let h = harness();
        let mut cart = widget_cart(&h.customer, 1);
        let options = CheckoutOptions::new("paypal")
            .with_decorator("loyalty_points")
            .with_loyalty_points(200);

        let receipt = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &options)
            .await
            .unwrap();

        assert_eq!(receipt.total, dec!(98));
        assert_eq!(receipt.loyalty_points_earned, 100);
        assert_eq!(receipt.discount, dec!(2));
        let customer = h.repo.get_customer(&h.customer.id).await.unwrap();
        assert_eq!(customer.loyalty_points, 400);
    }

    #[tokio::test]
    async fn test_checkout_uses_stored_cart() {
        let h = harness();
        h.facade.carts().add_item("cust-1", "prod-2", 2).await.unwrap();

        let receipt = h
            .facade
            .checkout(&CheckoutContext::new(), "cust-1", &CheckoutOptions::new("paypal"))
            .await
            .unwrap();

        assert_eq!(receipt.total, dec!(59.98));
        assert_eq!(receipt.customer_name, "John Doe");
        assert!(h.repo.get_cart_by_customer("cust-1").await.unwrap().is_empty());
        assert_eq!(h.repo.get_product("prod-2").await.unwrap().stock, 48);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let h = harness();
        let err = h
            .facade
            .checkout(&CheckoutContext::new(), "cust-1", &CheckoutOptions::new("paypal"))
            .await
            .unwrap_err();
        assert_eq!(err.root_kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_split_checkout() {
        let h = harness();
        let mut cart = widget_cart(&h.customer, 2);
        let options = CheckoutOptions::new("credit_card")
            .with_strategy("split")
            .with_split_part("credit_card", dec!(150))
            .with_split_part("paypal", dec!(50));

        let receipt = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &options)
            .await
            .unwrap();
        assert_eq!(receipt.payment_method, "split");
        assert_eq!(receipt.payment_details["payment_count"], 2);

        let mut cart = widget_cart(&h.customer, 1);
        let err = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &options)
            .await
            .unwrap_err();
        assert_eq!(err.root_kind(), ErrorKind::Validation);
        assert_eq!(h.repo.get_product(WIDGET).await.unwrap().stock, 3);

        let no_parts = CheckoutOptions::new("credit_card").with_strategy("split");
        let err = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &no_parts)
            .await
            .unwrap_err();
        assert_eq!(err.root_kind(), ErrorKind::Validation);
        assert_eq!(h.repo.get_product(WIDGET).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_deferred_checkout() {
        let h = harness();
        let mut cart = widget_cart(&h.customer, 3);
        let options = CheckoutOptions {
            installments: Some(3),
            ..CheckoutOptions::new("credit_card").with_strategy("deferred")
        };

        let receipt = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &options)
            .await
            .unwrap();
        assert_eq!(receipt.total, dec!(100));
        assert_eq!(receipt.payment_details["remaining_installments"], 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_surfaces_timeout() {
        let mut config = CheckoutConfig::default();
        config.payment.timeout_secs = 1;
        config.payment.simulated_latency_ms = 5_000;
        let h = harness_with(config, &[0, 99]);
        let mut cart = widget_cart(&h.customer, 1);

        let err = h
            .facade
            .process_order(&CheckoutContext::new(), &mut cart, &h.customer, &CheckoutOptions::new("paypal"))
            .await
            .unwrap_err();

        assert_eq!(err.root_kind(), ErrorKind::Timeout);
        assert!(!err.has_kind(ErrorKind::FraudDetected));
        assert_eq!(h.repo.get_product(WIDGET).await.unwrap().stock, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_until_success() {
        let h = harness();
        let payment = RecordingPayment::failing_on(&[1, 2]);
        let strategy = InstantStrategy::new(AmountLimits::new(dec!(1), dec!(1000)));

        let result = h
            .facade
            .execute_with_retry(&CheckoutContext::new(), &strategy, &payment, dec!(10))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(payment.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhausted() {
        let h = harness();
        let payment = RecordingPayment::failing_on(&[1, 2, 3, 4, 5]);
        let strategy = InstantStrategy::new(AmountLimits::new(dec!(1), dec!(1000)));

        assert!(h
            .facade
            .execute_with_retry(&CheckoutContext::new(), &strategy, &payment, dec!(10))
            .await
            .is_err());
        assert_eq!(payment.call_count(), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_stops_at_once() {
        let h = harness();
        let strategy = InstantStrategy::new(AmountLimits::new(dec!(1), dec!(1000)));
        for error in [
            (|| PaymentError::FraudDetected("risk".into())) as fn() -> PaymentError,
            || PaymentError::InvalidPayment("card".into()),
        ] {
            let payment = RecordingPayment::failing_with(error);
            assert!(h
                .facade
                .execute_with_retry(&CheckoutContext::new(), &strategy, &payment, dec!(10))
                .await
                .is_err());
            assert_eq!(payment.call_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let h = harness();
        let ctx = CheckoutContext::new();
        ctx.cancel();
        let payment = RecordingPayment::default();
        let strategy = InstantStrategy::new(AmountLimits::new(dec!(1), dec!(1000)));

        let err = h
            .facade
            .execute_with_retry(&ctx, &strategy, &payment, dec!(10))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(payment.call_count(), 0);
    }

    #[test]
    fn test_default_decorator_config_enables_all() {
        let factory = DecoratorFactory::new(DecoratorConfig::default());
        assert!(factory.available_decorators().iter().all(|d| factory.is_enabled(d)));
    }
}
