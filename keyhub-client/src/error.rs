//! Marketplace error types

use chrono::{DateTime, Utc};
use shared::error::{AppError, ErrorCode};
use std::time::Duration;
use thiserror::Error;

/// Marketplace error type
///
/// Timeouts are kept apart from every other failure so callers can tell
/// "the marketplace did not answer in time" from "the marketplace said no".
#[derive(Debug, Error)]
pub enum MarketError {
    /// A call or a poll budget ran out
    #[error("{operation} for {target} timed out after {}ms (budget {}ms)", .elapsed.as_millis(), .budget.as_millis())]
    Timeout {
        operation: &'static str,
        /// Order or reservation id the operation was about
        target: String,
        elapsed: Duration,
        budget: Duration,
    },

    /// Any non-timeout failure: transport, 4xx, 5xx, undecodable body
    #[error("Marketplace API error: {message}")]
    Api {
        /// Upstream HTTP status, when there was a response
        status: Option<u16>,
        message: String,
    },

    /// Operation the marketplace does not offer
    #[error("{operation} is not supported by the marketplace")]
    Unsupported { operation: &'static str },

    /// Bad input or a rejected webhook
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("quantity must be a positive integer, got {quantity}")]
    InvalidQuantity { quantity: u32 },

    /// Reservation is known to be past its validity window
    #[error("Reservation {reservation_id} expired at {expired_at}")]
    ReservationExpired {
        reservation_id: String,
        expired_at: DateTime<Utc>,
    },
}

impl MarketError {
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether a caller may reasonably try the same call again.
    ///
    /// Only timeouts, transport failures and 5xx answers qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Api { status, .. } => status.is_none_or(|s| s >= 500),
            Self::Unsupported { .. }
            | Self::Validation(_)
            | Self::InvalidQuantity { .. }
            | Self::ReservationExpired { .. } => false,
        }
    }
}

impl From<reqwest::Error> for MarketError {
    fn from(e: reqwest::Error) -> Self {
        MarketError::Api {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(e: serde_json::Error) -> Self {
        MarketError::api(None, format!("invalid response body: {e}"))
    }
}

impl From<MarketError> for AppError {
    fn from(e: MarketError) -> Self {
        match e {
            MarketError::Timeout {
                operation,
                target,
                elapsed,
                budget,
            } => {
                let code = if operation == crate::poller::WAIT_OPERATION {
                    ErrorCode::StockNotReady
                } else {
                    ErrorCode::MarketplaceTimeout
                };
                AppError::new(code)
                    .with_detail("operation", operation)
                    .with_detail("target", target)
                    .with_detail("elapsedMs", elapsed.as_millis() as u64)
                    .with_detail("budgetMs", budget.as_millis() as u64)
            }
            MarketError::Api { status, message } => {
                tracing::warn!(?status, %message, "Marketplace request failed");
                let err = AppError::with_message(ErrorCode::MarketplaceError, message);
                match status {
                    Some(s) => err.with_detail("upstreamStatus", s),
                    None => err,
                }
            }
            MarketError::Unsupported { operation } => {
                AppError::new(ErrorCode::ReservationCancelUnsupported)
                    .with_detail("operation", operation)
            }
            MarketError::Validation(message) => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
            }
            MarketError::InvalidQuantity { quantity } => {
                AppError::new(ErrorCode::InvalidQuantity).with_detail("quantity", quantity)
            }
            MarketError::ReservationExpired {
                reservation_id,
                expired_at,
            } => AppError::new(ErrorCode::ReservationExpired)
                .with_detail("reservationId", reservation_id)
                .with_detail("expiredAt", expired_at.to_rfc3339()),
        }
    }
}

/// Result type for marketplace operations
pub type MarketResult<T> = Result<T, MarketError>;
