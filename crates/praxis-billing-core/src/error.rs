//! Billing errors

use praxis_types::SubscriptionStatus;
use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Plan not found
    #[error("plan not found")]
    PlanNotFound,

    /// Subscription not found
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// User not found
    #[error("user not found")]
    UserNotFound,

    /// Operation not valid for the subscription's current state
    #[error("invalid subscription state: {current}")]
    InvalidState {
        /// The state the subscription is actually in
        current: SubscriptionStatus,
    },

    /// Usage quota exhausted for the current billing window
    #[error("usage limit exceeded: {used} / {limit}")]
    LimitExceeded {
        /// Units consumed this window
        used: i64,
        /// Window quota
        limit: i64,
    },

    /// The atomic check-and-increment detected contention; deny and retry
    #[error("concurrent usage update, retry")]
    ConcurrencyConflict,

    /// Usage quantity below 1
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Payment gateway rejected or timed out
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] praxis_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PlanNotFound | Self::SubscriptionNotFound | Self::UserNotFound
        )
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::PlanNotFound | Self::SubscriptionNotFound | Self::UserNotFound => 404,
            Self::InvalidState { .. } => 409,
            Self::LimitExceeded { .. } => 403,
            Self::ConcurrencyConflict => 429,
            Self::InvalidQuantity => 400,
            Self::Gateway(_) => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PlanNotFound => "PLAN_NOT_FOUND",
            Self::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Billing result type
pub type BillingResult<T> = Result<T, BillingError>;
