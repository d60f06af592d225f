use tracing::{info, warn};

use crate::error::{PaymentError, Result};
use crate::repository::SharedRepository;

/// Stock checks and reservations
#[derive(Clone)]
pub struct InventoryService {
    repo: SharedRepository,
}

impl InventoryService {
    pub fn new(repo: SharedRepository) -> Self {
        Self { repo }
    }

    pub async fn check_availability(&self, product_id: &str, quantity: u32) -> Result<bool> {
        let product = self.repo.get_product(product_id).await?;
        Ok(product.in_stock(quantity))
    }

    /// Take `quantity` units out of stock
    pub async fn reserve_stock(&self, product_id: &str, quantity: u32) -> Result<()> {
        let product = self
            .repo
            .adjust_stock(product_id, -i64::from(quantity))
            .await
            .map_err(|e| match e {
                PaymentError::Inventory(_) => PaymentError::Inventory(format!(
                    "insufficient stock for product {product_id}"
                )),
                other => other,
            })?;
        info!(product_id, quantity, remaining = product.stock, "Stock reserved");
        Ok(())
    }

    /// Return `quantity` units to stock
    pub async fn release_stock(&self, product_id: &str, quantity: u32) -> Result<()> {
        match self.repo.adjust_stock(product_id, i64::from(quantity)).await {
            Ok(product) => {
                info!(product_id, quantity, stock = product.stock, "Stock released");
                Ok(())
            }
            Err(e) => {
                warn!(product_id, quantity, error = %e, "Failed to release stock");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::product::Catalog;
    use crate::repository::InMemoryRepository;
    use std::sync::Arc;

    fn service() -> InventoryService {
        InventoryService::new(Arc::new(InMemoryRepository::with_catalog(&Catalog::demo())))
    }

    #[tokio::test]
    async fn test_reserve_and_release() {
        let inventory = service();
        assert!(inventory.check_availability("prod-1", 10).await.unwrap());
        inventory.reserve_stock("prod-1", 4).await.unwrap();
        assert!(!inventory.check_availability("prod-1", 7).await.unwrap());

        let err = inventory.reserve_stock("prod-1", 7).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inventory);

        inventory.release_stock("prod-1", 4).await.unwrap();
        assert!(inventory.check_availability("prod-1", 10).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let err = service().check_availability("nope", 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
