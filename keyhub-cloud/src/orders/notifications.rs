//! Business handling of verified marketplace notifications
//!
//! Only called after the digest has been checked.

use keyhub_client::WebhookPayload;
use serde::Serialize;
use shared::error::AppError;
use shared::models::{OrderRecord, OrderStatus};

use super::OrderService;
use crate::error::ServiceResult;

/// What a notification did to the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAction {
    Completed,
    Processing,
    Failed,
    /// Unknown order, unknown status, or nothing to change
    Ignored,
}

/// Acknowledgement returned to the marketplace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub order_id: String,
    pub action: WebhookAction,
}

impl OrderService {
    /// Apply a verified notification to the matching order record
    pub async fn handle_notification(&self, payload: &WebhookPayload) -> ServiceResult<WebhookAck> {
        let order_id = payload
            .get_str("orderId")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::validation("notification has no orderId"))?
            .to_string();
        let status = payload.get_str("status").unwrap_or_default().to_lowercase();

        let ack = |action| WebhookAck {
            order_id: order_id.clone(),
            action,
        };

        let Some(record) = self.orders.find(&order_id).await? else {
            tracing::info!(%order_id, %status, "Notification for unknown order ignored");
            return Ok(ack(WebhookAction::Ignored));
        };

        // Each change re-checks the stored record, which may have settled
        // while the inventory check was in flight.
        let action = match status.as_str() {
            "completed" | "complete" if record.status != OrderStatus::Completed => {
                let inventory = self.poller.check_inventory(&order_id).await?;
                let action = if inventory.stock_ready {
                    WebhookAction::Completed
                } else {
                    tracing::warn!(%order_id, "Completion notified but keys not listed yet");
                    WebhookAction::Processing
                };
                let written = self
                    .modify(&order_id, |record| {
                        if record.status.is_terminal() {
                            return false;
                        }
                        if inventory.stock_ready {
                            record.complete(inventory.keys().to_vec());
                        } else if record.status != OrderStatus::Processing {
                            record.transition(OrderStatus::Processing);
                        }
                        true
                    })
                    .await?;
                applied(written, action)
            }
            "processing" => {
                let written = self
                    .modify(&order_id, |record| {
                        if record.status.is_terminal() {
                            return false;
                        }
                        record.transition(OrderStatus::Processing);
                        true
                    })
                    .await?;
                applied(written, WebhookAction::Processing)
            }
            "canceled" | "cancelled" | "refunded" => {
                let reason = format!("marketplace reported order {status}");
                let written = self
                    .modify(&order_id, |record| {
                        if record.status == OrderStatus::Failed {
                            return false;
                        }
                        record.fail(reason.clone());
                        true
                    })
                    .await?;
                applied(written, WebhookAction::Failed)
            }
            _ => WebhookAction::Ignored,
        };

        if action == WebhookAction::Ignored {
            tracing::info!(%order_id, %status, order_status = record.status.as_str(), "Notification ignored");
        } else {
            tracing::info!(%order_id, %status, ?action, "Notification applied");
        }
        Ok(ack(action))
    }
}

fn applied(written: Option<OrderRecord>, action: WebhookAction) -> WebhookAction {
    if written.is_some() {
        action
    } else {
        WebhookAction::Ignored
    }
}
