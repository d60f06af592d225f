use tracing::debug;

use crate::cart::Cart;
use crate::error::{ErrorKind, PaymentError, Result};
use crate::repository::SharedRepository;

/// One cart per customer, created on first use
#[derive(Clone)]
pub struct CartService {
    repo: SharedRepository,
}

impl CartService {
    pub fn new(repo: SharedRepository) -> Self {
        Self { repo }
    }

    pub async fn get_or_create_cart(&self, customer_id: &str) -> Result<Cart> {
        match self.repo.get_cart_by_customer(customer_id).await {
            Ok(cart) => Ok(cart),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // The customer must exist before a cart is made for them
                self.repo.get_customer(customer_id).await?;
                debug!(customer_id, "Creating cart");
                self.repo.create_cart(Cart::new(customer_id)).await
            }
            Err(e) => Err(e),
        }
    }

    /// Add `quantity` of a product. The merged line quantity must be in stock.
    pub async fn add_item(&self, customer_id: &str, product_id: &str, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return Err(PaymentError::Validation("quantity must be positive".into()));
        }
        let product = self.repo.get_product(product_id).await?;
        let mut cart = self.get_or_create_cart(customer_id).await?;

        let in_cart = cart
            .items
            .iter()
            .find(|i| i.product_id == product_id)
            .map_or(0, |i| i.quantity);
        if !product.in_stock(in_cart + quantity) {
            return Err(PaymentError::Inventory(format!(
                "insufficient stock for {}: available {}, requested {}",
                product.name,
                product.stock,
                in_cart + quantity
            )));
        }

        cart.add_product(&product, quantity);
        self.repo.update_cart(cart).await
    }

    pub async fn remove_item(&self, customer_id: &str, product_id: &str) -> Result<Cart> {
        let mut cart = self.get_or_create_cart(customer_id).await?;
        if !cart.remove_item(product_id) {
            return Err(PaymentError::not_found("cart item", product_id));
        }
        self.repo.update_cart(cart).await
    }

    /// Set a line's quantity; zero removes the line
    pub async fn update_quantity(&self, customer_id: &str, product_id: &str, quantity: u32) -> Result<Cart> {
        let mut cart = self.get_or_create_cart(customer_id).await?;
        if quantity > 0 {
            let product = self.repo.get_product(product_id).await?;
            if !product.in_stock(quantity) {
                return Err(PaymentError::Inventory(format!(
                    "insufficient stock for {}: available {}, requested {quantity}",
                    product.name, product.stock
                )));
            }
        }
        if !cart.update_quantity(product_id, quantity) {
            return Err(PaymentError::not_found("cart item", product_id));
        }
        self.repo.update_cart(cart).await
    }

    pub async fn clear_cart(&self, customer_id: &str) -> Result<Cart> {
        let mut cart = self.get_or_create_cart(customer_id).await?;
        cart.clear();
        self.repo.update_cart(cart).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Catalog;
    use crate::repository::InMemoryRepository;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn service() -> CartService {
        CartService::new(Arc::new(InMemoryRepository::with_catalog(&Catalog::demo())))
    }

    #[tokio::test]
    async fn test_cart_created_once() {
        let carts = service();
        let first = carts.get_or_create_cart("cust-1").await.unwrap();
        let second = carts.get_or_create_cart("cust-1").await.unwrap();
        assert_eq!(first.id, second.id);

        let err = carts.get_or_create_cart("ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_add_merges_and_checks_stock() {
        let carts = service();
        carts.add_item("cust-1", "prod-1", 4).await.unwrap();
        let cart = carts.add_item("cust-1", "prod-1", 5).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item_count(), 9);
        assert_eq!(cart.total(), dec!(8999.91));

        let err = carts.add_item("cust-1", "prod-1", 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inventory);

        let err = carts.add_item("cust-1", "nope", 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_remove_clear() {
        let carts = service();
        carts.add_item("cust-1", "prod-2", 1).await.unwrap();
        carts.add_item("cust-1", "prod-3", 1).await.unwrap();

        let cart = carts.update_quantity("cust-1", "prod-2", 3).await.unwrap();
        assert_eq!(cart.item_count(), 4);

        let cart = carts.update_quantity("cust-1", "prod-2", 0).await.unwrap();
        assert_eq!(cart.items.len(), 1);

        assert!(carts.remove_item("cust-1", "prod-2").await.is_err());
        let cart = carts.clear_cart("cust-1").await.unwrap();
        assert!(cart.is_empty());
    }
}
