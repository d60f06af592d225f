use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{impl_repository, Store};
use crate::cart::Cart;
use crate::customer::Customer;
use crate::error::Result;
use crate::product::{Catalog, Product};
use crate::transaction::Transaction;

/// Process-local repository
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-loaded with `catalog`
    pub fn with_catalog(catalog: &Catalog) -> Self {
        let mut store = Store::default();
        store.seed(catalog);
        Self {
            store: RwLock::new(store),
        }
    }

    async fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().await
    }

    async fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().await
    }

    async fn commit(&self, _store: &Store) -> Result<()> {
        Ok(())
    }
}

impl_repository!(InMemoryRepository);
