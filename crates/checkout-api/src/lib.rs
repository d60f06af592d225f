//! # checkout-api
//!
//! HTTP API layer for checkout-engine-rs.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/products` | List products |
//! | GET | `/api/v1/products/{id}` | Get product |
//! | POST | `/api/v1/customers` | Register customer |
//! | GET | `/api/v1/customers/{id}` | Get customer |
//! | GET, DELETE | `/api/v1/customers/{id}/cart` | Get or clear cart |
//! | POST | `/api/v1/customers/{id}/cart/items` | Add item |
//! | PUT, DELETE | `/api/v1/customers/{id}/cart/items/{product_id}` | Change or remove item |
//! | POST | `/api/v1/customers/{id}/checkout` | Charge cart, returns receipt |
//! | POST | `/api/v1/customers/{id}/debit` | Currency debit quote |
//! | GET | `/api/v1/customers/{id}/transactions` | Transaction history |
//! | GET | `/api/v1/payment-methods` | Payment types, strategies, decorators |
//! | GET | `/api/v1/metrics` | Observer metrics snapshot |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
