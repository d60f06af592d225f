//! # Audit Log
//!
//! Appends one JSON line per event and flushes after every write.

use async_trait::async_trait;
use checkout_core::config::AuditConfig;
use checkout_core::{Event, EventType, Observer};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{NotifyError, Result};

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub transaction_id: String,
    pub customer_id: String,
    pub amount: Decimal,
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl From<&Event> for AuditEntry {
    fn from(event: &Event) -> Self {
        Self {
            timestamp: event.timestamp,
            event_type: event.event_type,
            transaction_id: event.transaction_id.clone(),
            customer_id: event.customer_id.clone(),
            amount: event.amount,
            payment_method: event.payment_method.clone(),
            error: event.error.clone(),
            metadata: event.metadata.clone(),
        }
    }
}

pub struct AuditLogger {
    path: PathBuf,
    file: Mutex<File>,
}

impl AuditLogger {
    pub const NAME: &'static str = "audit_logger";

    /// Open `path` for appending, creating parent directories as needed
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path).await?;
        info!(path = %path.display(), "Audit log opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub async fn from_config(config: &AuditConfig) -> Result<Self> {
        Self::open(&config.path).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        file.sync_data().await.map_err(NotifyError::from)
    }
}

#[async_trait]
impl Observer for AuditLogger {
    async fn notify(&self, event: &Event) -> checkout_core::Result<()> {
        self.append(&AuditEntry::from(event)).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/audit.log");
        let logger = AuditLogger::open(&path).await.unwrap();

        let started = Event::new(EventType::PaymentStarted, "tx-1", "cust-1", dec!(20), "paypal");
        let failed = Event::new(EventType::PaymentFailed, "tx-1", "cust-1", dec!(20), "paypal")
            .with_error("declined");
        logger.notify(&started).await.unwrap();
        logger.notify(&failed).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let entries: Vec<AuditEntry> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event_type, EventType::PaymentStarted);
        assert_eq!(entries[0].error, None);
        assert_eq!(entries[1].error.as_deref(), Some("declined"));
        assert_eq!(entries[1].amount, dec!(20));
        assert!(!contents.lines().next().unwrap().contains("\"error\""));
    }

    #[tokio::test]
    async fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let event = Event::new(EventType::PaymentSuccess, "tx-2", "cust-1", dec!(5), "crypto");

        AuditLogger::open(&path).await.unwrap().notify(&event).await.unwrap();
        AuditLogger::open(&path).await.unwrap().notify(&event).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
