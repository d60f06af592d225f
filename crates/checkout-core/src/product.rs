//! # Product Types
//!
//! Product and catalog types. The catalog is loaded from `config/catalog.toml`
//! and seeded into the repository at startup.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::customer::{Address, Customer};

/// A product available for purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier (e.g., "prod-1")
    pub id: String,

    /// Display name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Unit price in major units
    pub price: Decimal,

    /// Stock keeping unit
    pub sku: String,

    /// Units available
    pub stock: u32,

    #[serde(default)]
    pub category: String,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        sku: impl Into<String>,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            sku: sku.into(),
            stock,
            category: String::new(),
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn in_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

/// Seed data (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub products: Vec<Product>,

    #[serde(default)]
    pub customers: Vec<Customer>,
}

impl Catalog {
    /// Find a product by ID
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Built-in demo data used when no catalog file is found
    pub fn demo() -> Self {
        let product = |id: &str, name: &str, desc: &str, cents: i64, sku: &str, stock: u32, cat: &str| {
            Product::new(id, name, Decimal::new(cents, 2), sku, stock)
                .with_description(desc)
                .with_category(cat)
        };

        let now = Utc::now();
        Self {
            products: vec![
                product("prod-1", "Laptop", "High-performance laptop", 99_999, "LAP-001", 10, "Electronics"),
                product("prod-2", "Mouse", "Wireless mouse", 2_999, "MOU-001", 50, "Electronics"),
                product("prod-3", "Keyboard", "Mechanical keyboard", 7_999, "KEY-001", 30, "Electronics"),
                product("prod-4", "Headphones", "Noise-cancelling headphones", 19_999, "HEA-001", 20, "Electronics"),
                product("prod-5", "Monitor", "27-inch 4K monitor", 39_999, "MON-001", 15, "Electronics"),
            ],
            customers: vec![Customer {
                id: "cust-1".to_string(),
                email: "john.doe@example.com".to_string(),
                name: "John Doe".to_string(),
                phone: "+1234567890".to_string(),
                loyalty_points: 500,
                address: Address {
                    street: "123 Main St".to_string(),
                    city: "San Francisco".to_string(),
                    state: "CA".to_string(),
                    postal_code: "94102".to_string(),
                    country: "USA".to_string(),
                },
                created_at: now,
                updated_at: now,
            }],
        }
    }
}
