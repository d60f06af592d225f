//! # Repository
//!
//! Persistence boundary for customers, products, carts and transactions.
//!
//! Both backends keep the whole data set in a [`Store`] behind one
//! `tokio::sync::RwLock`. Every read-modify-write takes the write lock once, so
//! each call is atomic on its own; nothing spans calls.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::cart::Cart;
use crate::customer::Customer;
use crate::error::{PaymentError, Result};
use crate::product::{Catalog, Product};
use crate::transaction::Transaction;

/// Storage operations used by services and the checkout facade
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_customer(&self, customer: Customer) -> Result<Customer>;
    async fn get_customer(&self, id: &str) -> Result<Customer>;
    async fn get_customer_by_email(&self, email: &str) -> Result<Customer>;
    async fn update_customer(&self, customer: Customer) -> Result<Customer>;
    async fn delete_customer(&self, id: &str) -> Result<()>;
    async fn list_customers(&self, limit: usize, offset: usize) -> Result<Vec<Customer>>;

    async fn create_product(&self, product: Product) -> Result<Product>;
    async fn get_product(&self, id: &str) -> Result<Product>;
    async fn update_product(&self, product: Product) -> Result<Product>;
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Atomically add `delta` to a product's stock. Fails with an inventory
    /// error, leaving stock untouched, if the result would be negative.
    async fn adjust_stock(&self, id: &str, delta: i64) -> Result<Product>;

    async fn create_cart(&self, cart: Cart) -> Result<Cart>;
    async fn get_cart(&self, id: &str) -> Result<Cart>;
    async fn get_cart_by_customer(&self, customer_id: &str) -> Result<Cart>;
    async fn update_cart(&self, cart: Cart) -> Result<Cart>;

    async fn create_transaction(&self, transaction: Transaction) -> Result<Transaction>;
    async fn get_transaction(&self, id: &str) -> Result<Transaction>;
    async fn update_transaction(&self, transaction: Transaction) -> Result<Transaction>;

    /// Newest first
    async fn list_transactions_by_customer(
        &self,
        customer_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>>;
}

pub type SharedRepository = Arc<dyn Repository>;

/// The full data set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    customers: HashMap<String, Customer>,
    products: HashMap<String, Product>,
    carts: HashMap<String, Cart>,
    transactions: HashMap<String, Transaction>,
}

impl Store {
    /// Insert catalog entries whose ids are not present yet
    pub(crate) fn seed(&mut self, catalog: &Catalog) -> usize {
        let mut added = 0;
        for product in &catalog.products {
            if !self.products.contains_key(&product.id) {
                self.products.insert(product.id.clone(), product.clone());
                added += 1;
            }
        }
        for customer in &catalog.customers {
            if !self.customers.contains_key(&customer.id) {
                self.customers.insert(customer.id.clone(), customer.clone());
                added += 1;
            }
        }
        added
    }

    pub(crate) fn create_customer(&mut self, customer: Customer) -> Result<Customer> {
        if self.customers.contains_key(&customer.id) {
            return Err(PaymentError::already_exists("customer", &customer.id));
        }
        if self.customers.values().any(|c| c.email == customer.email) {
            return Err(PaymentError::already_exists("customer", &customer.email));
        }
        self.customers.insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    pub(crate) fn get_customer(&self, id: &str) -> Result<Customer> {
        self.customers
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("customer", id))
    }

    pub(crate) fn get_customer_by_email(&self, email: &str) -> Result<Customer> {
        self.customers
            .values()
            .find(|c| c.email == email)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("customer", email))
    }

    pub(crate) fn update_customer(&mut self, mut customer: Customer) -> Result<Customer> {
        let slot = self
            .customers
            .get_mut(&customer.id)
            .ok_or_else(|| PaymentError::not_found("customer", &customer.id))?;
        customer.updated_at = Utc::now();
        *slot = customer.clone();
        Ok(customer)
    }

    pub(crate) fn delete_customer(&mut self, id: &str) -> Result<()> {
        self.customers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PaymentError::not_found("customer", id))
    }

    pub(crate) fn list_customers(&self, limit: usize, offset: usize) -> Vec<Customer> {
        let mut customers: Vec<_> = self.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        customers.into_iter().skip(offset).take(limit).collect()
    }

    pub(crate) fn create_product(&mut self, product: Product) -> Result<Product> {
        if self.products.contains_key(&product.id) {
            return Err(PaymentError::already_exists("product", &product.id));
        }
        self.products.insert(product.id.clone(), product.clone());
        Ok(product)
    }

    pub(crate) fn get_product(&self, id: &str) -> Result<Product> {
        self.products
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("product", id))
    }

    pub(crate) fn update_product(&mut self, product: Product) -> Result<Product> {
        let slot = self
            .products
            .get_mut(&product.id)
            .ok_or_else(|| PaymentError::not_found("product", &product.id))?;
        *slot = product.clone();
        Ok(product)
    }

    pub(crate) fn list_products(&self) -> Vec<Product> {
        let mut products: Vec<_> = self.products.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    pub(crate) fn adjust_stock(&mut self, id: &str, delta: i64) -> Result<Product> {
        let product = self
            .products
            .get_mut(id)
            .ok_or_else(|| PaymentError::not_found("product", id))?;
        let stock = i64::from(product.stock) + delta;
        product.stock = u32::try_from(stock).map_err(|_| {
            PaymentError::Inventory(format!(
                "insufficient stock for product {id}: available {}, requested {}",
                product.stock, -delta
            ))
        })?;
        Ok(product.clone())
    }

    pub(crate) fn create_cart(&mut self, cart: Cart) -> Result<Cart> {
        if self.carts.contains_key(&cart.id) {
            return Err(PaymentError::already_exists("cart", &cart.id));
        }
        self.carts.insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    pub(crate) fn get_cart(&self, id: &str) -> Result<Cart> {
        self.carts
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("cart", id))
    }

    pub(crate) fn get_cart_by_customer(&self, customer_id: &str) -> Result<Cart> {
        self.carts
            .values()
            .find(|c| c.customer_id == customer_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("cart", customer_id))
    }

    pub(crate) fn update_cart(&mut self, mut cart: Cart) -> Result<Cart> {
        let slot = self
            .carts
            .get_mut(&cart.id)
            .ok_or_else(|| PaymentError::not_found("cart", &cart.id))?;
        cart.updated_at = Utc::now();
        *slot = cart.clone();
        Ok(cart)
    }

    pub(crate) fn create_transaction(&mut self, transaction: Transaction) -> Result<Transaction> {
        if self.transactions.contains_key(&transaction.id) {
            return Err(PaymentError::already_exists("transaction", &transaction.id));
        }
        self.transactions.insert(transaction.id.clone(), transaction.clone());
        Ok(transaction)
    }

    pub(crate) fn get_transaction(&self, id: &str) -> Result<Transaction> {
        self.transactions
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("transaction", id))
    }

    pub(crate) fn update_transaction(&mut self, transaction: Transaction) -> Result<Transaction> {
        let slot = self
            .transactions
            .get_mut(&transaction.id)
            .ok_or_else(|| PaymentError::not_found("transaction", &transaction.id))?;
        *slot = transaction.clone();
        Ok(transaction)
    }

    pub(crate) fn list_transactions_by_customer(
        &self,
        customer_id: &str,
        limit: usize,
        offset: usize,
    ) -> Vec<Transaction> {
        let mut transactions: Vec<_> = self
            .transactions
            .values()
            .filter(|t| t.customer_id == customer_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        transactions.into_iter().skip(offset).take(limit).collect()
    }
}

/// Implements [`Repository`] for a backend exposing `read()`, `write()` and
/// `commit(&Store)` over an inner `RwLock<Store>`.
///
/// Writes apply to a copy of the store, which replaces the live one only
/// once `commit` has succeeded.
macro_rules! impl_repository {
    ($backend:ty) => {
        #[async_trait::async_trait]
        impl $crate::repository::Repository for $backend {
            async fn create_customer(&self, customer: Customer) -> Result<Customer> {
                let mut store = self.write().await;
                let mut next = store.clone();
                let created = next.create_customer(customer)?;
                self.commit(&next).await?;
                *store = next;
                Ok(created)
            }

            async fn get_customer(&self, id: &str) -> Result<Customer> {
                self.read().await.get_customer(id)
            }

            async fn get_customer_by_email(&self, email: &str) -> Result<Customer> {
                self.read().await.get_customer_by_email(email)
            }

            async fn update_customer(&self, customer: Customer) -> Result<Customer> {
                let mut store = self.write().await;
                let mut next = store.clone();
                let updated = next.update_customer(customer)?;
                self.commit(&next).await?;
                *store = next;
                Ok(updated)
            }

            async fn delete_customer(&self, id: &str) -> Result<()> {
                let mut store = self.write().await;
                let mut next = store.clone();
                next.delete_customer(id)?;
                self.commit(&next).await?;
                *store = next;
                Ok(())
            }

            async fn list_customers(&self, limit: usize, offset: usize) -> Result<Vec<Customer>> {
                Ok(self.read().await.list_customers(limit, offset))
            }

            async fn create_product(&self, product: Product) -> Result<Product> {
                let mut store = self.write().await;
                let mut next = store.clone();
                let created = next.create_product(product)?;
                self.commit(&next).await?;
                *store = next;
                Ok(created)
            }

            async fn get_product(&self, id: &str) -> Result<Product> {
                self.read().await.get_product(id)
            }

            async fn update_product(&self, product: Product) -> Result<Product> {
                let mut store = self.write().await;
                let mut next = store.clone();
                let updated = next.update_product(product)?;
                self.commit(&next).await?;
                *store = next;
                Ok(updated)
            }

            async fn list_products(&self) -> Result<Vec<Product>> {
                Ok(self.read().await.list_products())
            }

            async fn adjust_stock(&self, id: &str, delta: i64) -> Result<Product> {
                let mut store = self.write().await;
                let mut next = store.clone();
                let updated = next.adjust_stock(id, delta)?;
                self.commit(&next).await?;
                *store = next;
                Ok(updated)
            }

            async fn create_cart(&self, cart: Cart) -> Result<Cart> {
                let mut store = self.write().await;
                let mut next = store.clone();
                let created = next.create_cart(cart)?;
                self.commit(&next).await?;
                *store = next;
                Ok(created)
            }

            async fn get_cart(&self, id: &str) -> Result<Cart> {
                self.read().await.get_cart(id)
            }

            async fn get_cart_by_customer(&self, customer_id: &str) -> Result<Cart> {
                self.read().await.get_cart_by_customer(customer_id)
            }

            async fn update_cart(&self, cart: Cart) -> Result<Cart> {
                let mut store = self.write().await;
                let mut next = store.clone();
                let updated = next.update_cart(cart)?;
                self.commit(&next).await?;
                *store = next;
                Ok(updated)
            }

            async fn create_transaction(&self, transaction: Transaction) -> Result<Transaction> {
                let mut store = self.write().await;
                let mut next = store.clone();
                let created = next.create_transaction(transaction)?;
                self.commit(&next).await?;
                *store = next;
                Ok(created)
            }

            async fn get_transaction(&self, id: &str) -> Result<Transaction> {
                self.read().await.get_transaction(id)
            }

            async fn update_transaction(&self, transaction: Transaction) -> Result<Transaction> {
                let mut store = self.write().await;
                let mut next = store.clone();
                let updated = next.update_transaction(transaction)?;
                self.commit(&next).await?;
                *store = next;
                Ok(updated)
            }

            async fn list_transactions_by_customer(
                &self,
                customer_id: &str,
                limit: usize,
                offset: usize,
            ) -> Result<Vec<Transaction>> {
                Ok(self
                    .read()
                    .await
                    .list_transactions_by_customer(customer_id, limit, offset))
            }
        }
    };
}

pub(crate) use impl_repository;

mod file;
mod memory;

pub use file::JsonFileRepository;
pub use memory::InMemoryRepository;
