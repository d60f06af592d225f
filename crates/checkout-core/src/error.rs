//! # Checkout Error Types
//!
//! Typed error handling for the checkout engine.
//! All fallible operations return `Result<T, PaymentError>`.
//!
//! Every error carries an [`ErrorKind`]. Wrapping an error with
//! [`PaymentError::wrap`] adds a stage description and a new outer kind
//! while keeping the inner error reachable, so classification (for example
//! "was this fraud?") keeps working after the orchestrator has wrapped it.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Classification shared by every error the engine produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    NotFound,
    AlreadyExists,
    Unauthorized,
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
    PaymentFailed,
    InsufficientFunds,
    InvalidPayment,
    FraudDetected,
    #[serde(rename = "INVENTORY_ERROR")]
    Inventory,
    Timeout,
}

impl ErrorKind {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Internal => "INTERNAL_ERROR",
            ErrorKind::PaymentFailed => "PAYMENT_FAILED",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::InvalidPayment => "INVALID_PAYMENT",
            ErrorKind::FraudDetected => "FRAUD_DETECTED",
            ErrorKind::Inventory => "INVENTORY_ERROR",
            ErrorKind::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Malformed input: card data, amounts, feature names
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record absent from the repository
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Duplicate creation
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Charge could not be completed
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Unknown or unusable payment method
    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    /// Rejected by fraud screening
    #[error("Fraud detected: {0}")]
    FraudDetected(String),

    /// Stock shortfall or reservation failure
    #[error("Inventory error: {0}")]
    Inventory(String),

    /// Deadline passed or context cancelled
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Configuration errors (bad TOML, invalid decorator parameters)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Storage or serialization failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// An inner error annotated with a stage description
    #[error("{context}: {source}")]
    Wrapped {
        kind: ErrorKind,
        context: String,
        #[source]
        source: Box<PaymentError>,
    },
}

impl PaymentError {
    /// Wrap `source` under a new outer kind, keeping it reachable for [`has_kind`](Self::has_kind)
    pub fn wrap(source: PaymentError, kind: ErrorKind, context: impl Into<String>) -> Self {
        PaymentError::Wrapped {
            kind,
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        PaymentError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn already_exists(entity: &'static str, id: impl Into<String>) -> Self {
        PaymentError::AlreadyExists {
            entity,
            id: id.into(),
        }
    }

    /// Outermost kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::Validation(_) => ErrorKind::Validation,
            PaymentError::NotFound { .. } => ErrorKind::NotFound,
            PaymentError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            PaymentError::Unauthorized(_) => ErrorKind::Unauthorized,
            PaymentError::PaymentFailed(_) => ErrorKind::PaymentFailed,
            PaymentError::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            PaymentError::InvalidPayment(_) => ErrorKind::InvalidPayment,
            PaymentError::FraudDetected(_) => ErrorKind::FraudDetected,
            PaymentError::Inventory(_) => ErrorKind::Inventory,
            PaymentError::Timeout(_) => ErrorKind::Timeout,
            PaymentError::Configuration(_) | PaymentError::Internal(_) => ErrorKind::Internal,
            PaymentError::Wrapped { kind, .. } => *kind,
        }
    }

    /// Kind of the innermost error
    pub fn root_kind(&self) -> ErrorKind {
        match self {
            PaymentError::Wrapped { source, .. } => source.root_kind(),
            other => other.kind(),
        }
    }

    /// True if `kind` appears anywhere in the wrap chain
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        if self.kind() == kind {
            return true;
        }
        match self {
            PaymentError::Wrapped { source, .. } => source.has_kind(kind),
            _ => false,
        }
    }

    /// Returns true if a checkout attempt failing with this error may be retried
    pub fn is_retryable(&self) -> bool {
        !(self.has_kind(ErrorKind::FraudDetected)
            || self.has_kind(ErrorKind::InvalidPayment)
            || self.has_kind(ErrorKind::Timeout))
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self.root_kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::AlreadyExists => 409,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Internal => 500,
            ErrorKind::PaymentFailed => 402,
            ErrorKind::InsufficientFunds => 402,
            ErrorKind::InvalidPayment => 400,
            ErrorKind::FraudDetected => 403,
            ErrorKind::Inventory => 409,
            ErrorKind::Timeout => 504,
        }
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        PaymentError::Internal(format!("serialization: {err}"))
    }
}

impl From<std::io::Error> for PaymentError {
    fn from(err: std::io::Error) -> Self {
        PaymentError::Internal(format!("io: {err}"))
    }
}

/// Result type alias for checkout operations
pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PaymentError::PaymentFailed("gateway hiccup".into()).is_retryable());
        assert!(PaymentError::Validation("amount".into()).is_retryable());
        assert!(!PaymentError::FraudDetected("score".into()).is_retryable());
        assert!(!PaymentError::InvalidPayment("method".into()).is_retryable());
        assert!(!PaymentError::Timeout("deadline".into()).is_retryable());
    }

    #[test]
    fn test_wrapped_kind_survives() {
        let inner = PaymentError::FraudDetected("risk score 90".into());
        let wrapped = PaymentError::wrap(
            PaymentError::wrap(inner, ErrorKind::PaymentFailed, "instant payment processing failed"),
            ErrorKind::PaymentFailed,
            "payment processing failed",
        );

        assert_eq!(wrapped.kind(), ErrorKind::PaymentFailed);
        assert_eq!(wrapped.root_kind(), ErrorKind::FraudDetected);
        assert!(wrapped.has_kind(ErrorKind::FraudDetected));
        assert!(!wrapped.has_kind(ErrorKind::Timeout));
        assert!(!wrapped.is_retryable());
        assert_eq!(
            wrapped.to_string(),
            "payment processing failed: instant payment processing failed: Fraud detected: risk score 90"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(PaymentError::Validation("test".into()).status_code(), 400);
        assert_eq!(PaymentError::not_found("product", "x").status_code(), 404);
        assert_eq!(PaymentError::already_exists("customer", "a@b.c").status_code(), 409);
        let wrapped = PaymentError::wrap(
            PaymentError::Inventory("out of stock".into()),
            ErrorKind::PaymentFailed,
            "inventory validation failed",
        );
        assert_eq!(wrapped.status_code(), 409);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorKind::Inventory.code(), "INVENTORY_ERROR");
        assert_eq!(
            serde_json::to_string(&ErrorKind::Validation).unwrap(),
            "\"VALIDATION_ERROR\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorKind::FraudDetected).unwrap(),
            "\"FRAUD_DETECTED\""
        );
    }
}
