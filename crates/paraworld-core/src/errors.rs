//! Error types for the Parallel World client

use thiserror::Error;

use crate::{Currency, RawAmount, ResourceType};

/// Core errors that can occur in the client workspace
#[derive(Debug, Error)]
pub enum Error {
    #[error("Backend error: {0}")]
    Client(#[from] ClientError),

    #[error("Purchase rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Backend transport and API errors
#[derive(Debug, Error, Clone)]
pub enum ClientError {
    #[error("Network failure talking to {url}: {message}")]
    Network { url: String, message: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Session is unauthenticated")]
    Unauthorized,

    #[error("Backend rejected request: {message}")]
    Rejected { message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Local purchase admissibility rejections
///
/// These are cheap, synchronous, and purely advisory: they are surfaced
/// inline to the user and never reach the network layer or error logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Purchase status not loaded")]
    NotReady,

    #[error("Invalid quantity {quantity}: must be between 1 and {single_limit}")]
    InvalidQuantity { quantity: i64, single_limit: i64 },

    #[error("Daily limit reached: {remaining} of {daily_limit} still purchasable today")]
    DailyLimitExceeded { remaining: i64, daily_limit: i64 },

    #[error("Insufficient {currency} balance: need {required}, have {available}")]
    InsufficientBalance {
        currency: Currency,
        required: RawAmount,
        available: RawAmount,
    },

    #[error("A purchase for {resource} is already in flight")]
    PurchaseInProgress { resource: ResourceType },
}

impl ValidationError {
    /// Get a UI-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotReady => "not_ready",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::DailyLimitExceeded { .. } => "daily_limit_exceeded",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::PurchaseInProgress { .. } => "purchase_in_progress",
        }
    }

    /// Exact shortfall for an `InsufficientBalance` rejection
    pub fn shortfall(&self) -> Option<RawAmount> {
        match self {
            Self::InsufficientBalance {
                required, available, ..
            } => Some(required - available),
            _ => None,
        }
    }
}

impl ClientError {
    /// Get a UI-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network_error",
            Self::Timeout { .. } => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::Rejected { .. } => "server_rejected",
            Self::Parse(_) => "parse_error",
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;
