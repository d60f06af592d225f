//! # Transactions and Receipts
//!
//! A [`Transaction`] tracks one `process_order` call through its lifecycle:
//!
//! ```text
//! pending ──▶ processing ──┬──▶ completed ──▶ refunded
//!                          └──▶ failed
//! ```
//!
//! A [`Receipt`] is produced only for completed transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::cart::Cart;
use crate::customer::Customer;
use crate::payment::PaymentResult;
use crate::product::Product;

/// Lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Refunded => "refunded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Failed | TransactionStatus::Refunded
        )
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub customer_id: String,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub payment_method: String,

    /// Instrument details and payment facts at the time of the charge
    #[serde(default)]
    pub payment_details: BTreeMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// A new `pending` transaction with a fresh id
    pub fn new(customer_id: impl Into<String>, amount: Decimal, payment_method: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            amount,
            status: TransactionStatus::Pending,
            payment_method: payment_method.into(),
            payment_details: BTreeMap::new(),
            error_message: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    pub fn mark_processing(&mut self) {
        self.status = TransactionStatus::Processing;
    }

    /// Record the charge and its facts
    pub fn mark_completed(&mut self, result: &PaymentResult) {
        self.status = TransactionStatus::Completed;
        self.amount = result.amount;
        self.payment_details = result.metadata.clone();
        self.processed_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = TransactionStatus::Failed;
        self.error_message = Some(error.into());
        self.processed_at = Some(Utc::now());
    }
}

/// One purchased line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// Customer-facing record of a completed checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,
    pub transaction_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<ReceiptItem>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub cashback: Decimal,
    pub loyalty_points_earned: u64,
    /// Amount charged, as reported by the payment result
    pub total: Decimal,
    pub payment_method: String,
    pub payment_details: BTreeMap<String, serde_json::Value>,
    pub applied_decorators: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Receipt {
    /// Assemble a receipt. `products` supplies SKUs for cart lines where known.
    pub fn build(
        transaction: &Transaction,
        customer: &Customer,
        cart: &Cart,
        products: &[Product],
        result: &PaymentResult,
    ) -> Self {
        let items = cart
            .items
            .iter()
            .map(|item| ReceiptItem {
                product_id: item.product_id.clone(),
                name: item.product_name.clone(),
                sku: products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(|p| p.sku.clone())
                    .unwrap_or_default(),
                quantity: item.quantity,
                unit_price: item.price,
                total: item.total(),
            })
            .collect();

        let discount = result.meta_decimal("discount_amount").unwrap_or_default()
            + result.meta_decimal("loyalty_discount").unwrap_or_default();

        Self {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction.id.clone(),
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            items,
            subtotal: cart.total(),
            discount,
            tax: result.meta_decimal("tax_amount").unwrap_or_default(),
            cashback: result.meta_decimal("cashback_amount").unwrap_or_default(),
            loyalty_points_earned: result.meta_u64("loyalty_points_earned").unwrap_or_default(),
            total: result.amount,
            payment_method: result.payment_method.clone(),
            payment_details: result.metadata.clone(),
            applied_decorators: result.applied_decorators.clone(),
            created_at: Utc::now(),
        }
    }
}
