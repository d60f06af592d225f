//! # Customer Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Postal address. `state` doubles as the tax region key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

/// A registered customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: String,
    pub name: String,

    #[serde(default)]
    pub phone: String,

    /// Redeemable loyalty balance
    #[serde(default)]
    pub loyalty_points: u64,

    #[serde(default)]
    pub address: Address,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Create a new customer with generated ID and an empty loyalty balance
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.into(),
            name: name.into(),
            phone: String::new(),
            loyalty_points: 0,
            address: Address::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder: set phone
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    /// Builder: set address
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Builder: set loyalty balance
    pub fn with_loyalty_points(mut self, points: u64) -> Self {
        self.loyalty_points = points;
        self
    }

    /// Region key used for tax lookup
    pub fn tax_region(&self) -> &str {
        if self.address.state.is_empty() {
            "DEFAULT"
        } else {
            &self.address.state
        }
    }
}
