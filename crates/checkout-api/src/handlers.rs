//! # Request Handlers
//!
//! Axum request handlers for the checkout API. Every failure is rendered as
//! `{"error": ..., "code": ...}` with the status from
//! [`PaymentError::status_code`].

use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use checkout_core::{
    Address, Cart, CheckoutContext, CheckoutOptions, Currency, Customer, DebitQuote, PaymentError,
    Product, Receipt, Transaction,
};
use checkout_notify::MetricsSnapshot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterCustomerRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// Quote the current cart total against a balance held in another currency
#[derive(Debug, Deserialize)]
pub struct DebitRequest {
    /// Currency of the cart and the balance
    #[serde(default = "default_currency")]
    pub from: Currency,
    pub to: Currency,
    pub balance: Decimal,
}

fn default_currency() -> Currency {
    Currency::USD
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PaymentMethodsResponse {
    pub payment_types: Vec<&'static str>,
    pub strategies: Vec<&'static str>,
    pub decorators: Vec<&'static str>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Handler error carrying a [`PaymentError`]
#[derive(Debug)]
pub struct ApiError(pub PaymentError);

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: self.0.root_kind().code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "checkout-engine",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List all products
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    Ok(Json(state.facade.repository().list_products().await?))
}

/// Get a single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Product> {
    Ok(Json(state.facade.repository().get_product(&product_id).await?))
}

#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<RegisterCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = state
        .facade
        .customers()
        .register(
            &request.email,
            &request.name,
            request.phone.as_deref(),
            request.address,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Customer> {
    Ok(Json(state.facade.customers().get(&customer_id).await?))
}

pub async fn get_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Cart> {
    Ok(Json(state.facade.carts().get_or_create_cart(&customer_id).await?))
}

#[instrument(skip(state, request), fields(product_id = %request.product_id, quantity = request.quantity))]
pub async fn add_cart_item(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<Cart> {
    let cart = state
        .facade
        .carts()
        .add_item(&customer_id, &request.product_id, request.quantity)
        .await?;
    Ok(Json(cart))
}

pub async fn update_cart_item(
    State(state): State<AppState>,
    Path((customer_id, product_id)): Path<(String, String)>,
    Json(request): Json<UpdateQuantityRequest>,
) -> ApiResult<Cart> {
    let cart = state
        .facade
        .carts()
        .update_quantity(&customer_id, &product_id, request.quantity)
        .await?;
    Ok(Json(cart))
}

pub async fn remove_cart_item(
    State(state): State<AppState>,
    Path((customer_id, product_id)): Path<(String, String)>,
) -> ApiResult<Cart> {
    Ok(Json(
        state.facade.carts().remove_item(&customer_id, &product_id).await?,
    ))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Cart> {
    Ok(Json(state.facade.carts().clear_cart(&customer_id).await?))
}

/// Charge the stored cart and return the receipt
#[instrument(skip(state, options), fields(method = %options.payment_method, strategy = %options.strategy))]
pub async fn checkout(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(mut options): Json<CheckoutOptions>,
) -> ApiResult<Receipt> {
    // Contact details for the email and SMS observers
    let customer = state.facade.customers().get(&customer_id).await?;
    options
        .metadata
        .entry("customer_email".to_string())
        .or_insert(customer.email);
    if !customer.phone.is_empty() {
        options
            .metadata
            .entry("customer_phone".to_string())
            .or_insert(customer.phone);
    }

    let receipt = state
        .facade
        .checkout(&CheckoutContext::new(), &customer_id, &options)
        .await?;
    info!(receipt_id = %receipt.id, total = %receipt.total, "Checkout completed");
    Ok(Json(receipt))
}

pub async fn debit_quote(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(request): Json<DebitRequest>,
) -> ApiResult<DebitQuote> {
    let cart = state.facade.carts().get_or_create_cart(&customer_id).await?;
    if cart.is_empty() {
        return Err(PaymentError::Validation("cart is empty".into()).into());
    }
    let quote = DebitQuote::build(
        &state.facade.config().exchange,
        cart.total(),
        request.balance,
        request.from,
        request.to,
    )?;
    Ok(Json(quote))
}

pub async fn transaction_history(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<Transaction>> {
    let history = state
        .facade
        .transaction_history(
            &customer_id,
            query.limit.unwrap_or(0),
            query.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(history))
}

pub async fn payment_methods(State(state): State<AppState>) -> Json<PaymentMethodsResponse> {
    let facade = &state.facade;
    let decorators = facade.decorator_factory();
    Json(PaymentMethodsResponse {
        payment_types: facade.payment_factory().supported_types(),
        strategies: facade.strategy_factory().supported_strategies(),
        decorators: decorators
            .available_decorators()
            .into_iter()
            .filter(|name| decorators.is_enabled(name))
            .collect(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
