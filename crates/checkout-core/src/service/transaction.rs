use tracing::debug;

use crate::error::{ErrorKind, Result};
use crate::repository::SharedRepository;
use crate::transaction::Transaction;

/// Transaction persistence and history
#[derive(Clone)]
pub struct TransactionService {
    repo: SharedRepository,
}

impl TransactionService {
    pub const DEFAULT_PAGE: usize = 50;

    pub fn new(repo: SharedRepository) -> Self {
        Self { repo }
    }

    /// Insert or overwrite
    pub async fn record(&self, transaction: Transaction) -> Result<Transaction> {
        debug!(transaction_id = %transaction.id, status = %transaction.status, "Recording transaction");
        match self.repo.update_transaction(transaction.clone()).await {
            Err(e) if e.kind() == ErrorKind::NotFound => self.repo.create_transaction(transaction).await,
            other => other,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Transaction> {
        self.repo.get_transaction(id).await
    }

    /// Newest first; a zero `limit` means the default page size
    pub async fn history(&self, customer_id: &str, limit: usize, offset: usize) -> Result<Vec<Transaction>> {
        let limit = if limit == 0 { Self::DEFAULT_PAGE } else { limit };
        self.repo
            .list_transactions_by_customer(customer_id, limit, offset)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use crate::transaction::TransactionStatus;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_record_upserts() {
        let transactions = TransactionService::new(Arc::new(InMemoryRepository::new()));
        let mut tx = Transaction::new("cust-1", dec!(10), "paypal");
        transactions.record(tx.clone()).await.unwrap();

        tx.mark_failed("declined");
        transactions.record(tx.clone()).await.unwrap();

        assert_eq!(transactions.get(&tx.id).await.unwrap().status, TransactionStatus::Failed);
        assert_eq!(transactions.history("cust-1", 0, 0).await.unwrap().len(), 1);
    }
}
