//! Unified service-layer error type for keyhub-cloud
//!
//! `ServiceError` bridges record-store and infrastructure errors and the
//! API-layer error (`AppError`), so handlers can use `?` on both.

use axum::response::IntoResponse;
use keyhub_client::MarketError;
use shared::error::{AppError, ErrorCode};

use crate::db::StoreError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: record-store/infrastructure errors (logged, mapped to InternalError)
/// - `App`: business errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(id) => ServiceError::App(
                AppError::new(ErrorCode::OrderAlreadyExists).with_detail("orderId", id),
            ),
            StoreError::NotFound(id) => ServiceError::App(
                AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", id),
            ),
            other => ServiceError::Db(other.into()),
        }
    }
}

impl From<MarketError> for ServiceError {
    fn from(e: MarketError) -> Self {
        ServiceError::App(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service record store error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflict_is_business_error() {
        let err: AppError = ServiceError::from(StoreError::Conflict("O1".into())).into();
        assert_eq!(err.code, ErrorCode::OrderAlreadyExists);
    }

    #[test]
    fn test_store_io_is_hidden() {
        let io = std::io::Error::other("disk on fire");
        let err: AppError = ServiceError::from(StoreError::from(io)).into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(!err.message.contains("disk"));
    }

    #[test]
    fn test_market_timeout_maps_to_gateway_timeout() {
        let err: AppError = ServiceError::from(MarketError::Timeout {
            operation: "confirm_reservation",
            target: "R1".into(),
            elapsed: std::time::Duration::from_secs(9),
            budget: std::time::Duration::from_secs(9),
        })
        .into();
        assert_eq!(err.code, ErrorCode::MarketplaceTimeout);
        assert_eq!(err.http_status(), http::StatusCode::GATEWAY_TIMEOUT);
    }
}
