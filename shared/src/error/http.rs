//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound | Self::OrderNotFound | Self::GameNotFound | Self::GenreNotFound => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict
            Self::AlreadyExists | Self::OrderAlreadyExists => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::WebhookSignatureMissing | Self::WebhookSignatureInvalid => {
                StatusCode::UNAUTHORIZED
            }

            // 410 Gone
            Self::ReservationExpired => StatusCode::GONE,

            // 501 Not Implemented (capability the marketplace does not offer)
            Self::ReservationCancelUnsupported => StatusCode::NOT_IMPLEMENTED,

            // 502 Bad Gateway
            Self::MarketplaceError => StatusCode::BAD_GATEWAY,

            // 504 Gateway Timeout
            Self::MarketplaceTimeout => StatusCode::GATEWAY_TIMEOUT,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::StockNotReady => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
