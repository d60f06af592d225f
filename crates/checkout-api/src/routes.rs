//! # Routes
//!
//! Axum router configuration for the checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health
/// - GET  /api/v1/products, /api/v1/products/{id}
/// - POST /api/v1/customers, GET /api/v1/customers/{id}
/// - GET|DELETE /api/v1/customers/{id}/cart
/// - POST /api/v1/customers/{id}/cart/items
/// - PUT|DELETE /api/v1/customers/{id}/cart/items/{product_id}
/// - POST /api/v1/customers/{id}/checkout
/// - POST /api/v1/customers/{id}/debit
/// - GET  /api/v1/customers/{id}/transactions
/// - GET  /api/v1/payment-methods
/// - GET  /api/v1/metrics
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let customer_routes = Router::new()
        .route("/{customer_id}", get(handlers::get_customer))
        .route(
            "/{customer_id}/cart",
            get(handlers::get_cart).delete(handlers::clear_cart),
        )
        .route("/{customer_id}/cart/items", post(handlers::add_cart_item))
        .route(
            "/{customer_id}/cart/items/{product_id}",
            put(handlers::update_cart_item).delete(handlers::remove_cart_item),
        )
        .route("/{customer_id}/checkout", post(handlers::checkout))
        .route("/{customer_id}/debit", post(handlers::debit_quote))
        .route("/{customer_id}/transactions", get(handlers::transaction_history));

    let api_routes = Router::new()
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product))
        .route("/customers", post(handlers::create_customer))
        .nest("/customers", customer_routes)
        .route("/payment-methods", get(handlers::payment_methods))
        .route("/metrics", get(handlers::metrics));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
