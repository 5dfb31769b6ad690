//! Unified error codes for keyhub
//!
//! This module defines all error codes returned by the storefront API.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Reservation errors
//! - 4xxx: Order errors
//! - 6xxx: Catalog errors
//! - 7xxx: Marketplace errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// Webhook arrived without a digest
    WebhookSignatureMissing = 1101,
    /// Webhook digest does not match the payload
    WebhookSignatureInvalid = 1102,

    // ==================== 3xxx: Reservation ====================
    /// Reservation validity window has passed
    ReservationExpired = 3002,
    /// Marketplace offers no way to cancel a reservation
    ReservationCancelUnsupported = 3003,
    /// Quantity must be a positive integer
    InvalidQuantity = 3004,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order id already used by another checkout
    OrderAlreadyExists = 4002,
    /// Keys are not provisioned yet
    StockNotReady = 4003,

    // ==================== 6xxx: Catalog ====================
    /// Game not found
    GameNotFound = 6001,
    /// Genre not found
    GenreNotFound = 6002,
    /// Cache pattern outside the reserved namespaces
    InvalidCachePattern = 6101,

    // ==================== 7xxx: Marketplace ====================
    /// Marketplace did not answer within its deadline
    MarketplaceTimeout = 7001,
    /// Marketplace rejected or failed the request
    MarketplaceError = 7002,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Numeric value of this code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default human-readable message
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::WebhookSignatureMissing => "Webhook signature is missing",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature is invalid",

            // Reservation
            ErrorCode::ReservationExpired => "Reservation has expired",
            ErrorCode::ReservationCancelUnsupported => {
                "Reservations cannot be cancelled, they expire on their own"
            }
            ErrorCode::InvalidQuantity => "Quantity must be a positive integer",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyExists => "Order already exists",
            ErrorCode::StockNotReady => "Your keys are still being prepared, try again later",

            // Catalog
            ErrorCode::GameNotFound => "Game not found",
            ErrorCode::GenreNotFound => "Genre not found",
            ErrorCode::InvalidCachePattern => "Cache pattern must target a reserved namespace",

            // Marketplace
            ErrorCode::MarketplaceTimeout => "Marketplace did not respond in time, try again later",
            ErrorCode::MarketplaceError => "Marketplace request failed",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Returned when a u16 does not map to any [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,
            8 => ErrorCode::ValueOutOfRange,

            1101 => ErrorCode::WebhookSignatureMissing,
            1102 => ErrorCode::WebhookSignatureInvalid,

            3002 => ErrorCode::ReservationExpired,
            3003 => ErrorCode::ReservationCancelUnsupported,
            3004 => ErrorCode::InvalidQuantity,

            4001 => ErrorCode::OrderNotFound,
            4002 => ErrorCode::OrderAlreadyExists,
            4003 => ErrorCode::StockNotReady,

            6001 => ErrorCode::GameNotFound,
            6002 => ErrorCode::GenreNotFound,
            6101 => ErrorCode::InvalidCachePattern,

            7001 => ErrorCode::MarketplaceTimeout,
            7002 => ErrorCode::MarketplaceError,

            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,

            _ => return Err(InvalidErrorCode(value)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
