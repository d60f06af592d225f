use std::path::{Path, PathBuf};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use super::{impl_repository, Store};
use crate::cart::Cart;
use crate::customer::Customer;
use crate::error::{PaymentError, Result};
use crate::product::{Catalog, Product};
use crate::transaction::Transaction;

/// In-memory store mirrored to a JSON snapshot file.
///
/// The snapshot is read once by [`open`](Self::open) and rewritten in full
/// after every mutation, while the write lock is still held.
#[derive(Debug)]
pub struct JsonFileRepository {
    store: RwLock<Store>,
    path: PathBuf,
}

impl JsonFileRepository {
    /// Load `path`, or start empty when it does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Store::default(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), "Opened JSON repository");
        Ok(Self {
            store: RwLock::new(store),
            path,
        })
    }

    /// Add catalog entries that are missing from the snapshot
    pub async fn seed(&self, catalog: &Catalog) -> Result<usize> {
        let mut store = self.store.write().await;
        let mut next = store.clone();
        let added = next.seed(catalog);
        if added > 0 {
            self.commit(&next).await?;
            *store = next;
        }
        Ok(added)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().await
    }

    async fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().await
    }

    async fn commit(&self, store: &Store) -> Result<()> {
        let json = serde_json::to_vec_pretty(store)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            PaymentError::Internal(format!("failed to replace {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), bytes = json.len(), "Snapshot written");
        Ok(())
    }
}

impl_repository!(JsonFileRepository);
