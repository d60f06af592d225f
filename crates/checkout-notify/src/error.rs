use checkout_core::PaymentError;
use thiserror::Error;

/// Delivery failures raised by observers
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("email queue full")]
    QueueFull,

    #[error("{0} is shut down")]
    Closed(&'static str),

    #[error("SMS rate limit exceeded ({0} messages per minute)")]
    RateLimited(usize),

    #[error("webhook failed after {attempts} attempts: {reason}")]
    Delivery { attempts: u32, reason: String },

    #[error("webhook client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("payload signing failed: {0}")]
    Signing(String),

    #[error("audit log error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<NotifyError> for PaymentError {
    fn from(err: NotifyError) -> Self {
        PaymentError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;
