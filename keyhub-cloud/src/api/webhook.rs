//! Marketplace notification webhook
//!
//! POST /webhooks/marketplace: raw body, digest in `X-Webhook-Signature`
//! or in the `signature` body field. Nothing is touched unless the digest
//! matches.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use keyhub_client::webhook::{SIGNATURE_FIELD, SIGNATURE_HEADER};
use keyhub_client::WebhookPayload;
use shared::error::{ApiResponse, AppError, ErrorCode};

use super::ApiResult;
use crate::orders::WebhookAck;
use crate::state::AppState;

pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookAck> {
    let mut payload = WebhookPayload::from_slice(&body).map_err(|e| {
        state.metrics.record_webhook(false);
        tracing::warn!(target: "audit", error = %e, "Unparseable webhook body");
        AppError::invalid_request(e.to_string())
    })?;

    // The body field is never part of the signed content
    let body_digest = payload
        .remove(SIGNATURE_FIELD)
        .and_then(|v| v.as_str().map(str::to_string));
    let digest = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(body_digest);

    if let Err(e) = state.webhooks.verify(&payload, digest.as_deref()) {
        let code = if digest.as_deref().is_none_or(str::is_empty) {
            ErrorCode::WebhookSignatureMissing
        } else {
            ErrorCode::WebhookSignatureInvalid
        };
        tracing::warn!(target: "audit", error = %e, ?code, "Webhook rejected");
        return Err(AppError::new(code).into());
    }

    let ack = state.orders.handle_notification(&payload).await?;
    Ok(Json(ApiResponse::success(ack)))
}
