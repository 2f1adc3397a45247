//! Payment gateway webhook: the signed server-to-server callback that moves
//! an order out of `pending`.
//!
//! The signature is checked over the raw body before anything else; a bad or
//! missing signature changes no state. Matching is keyed by the gateway
//! order identifier, so replays re-apply the same fields (and re-send the
//! confirmation email — there is no dedup token).

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::json;

use crate::domain::aggregates::order::{Order, OrderError, Purchase};
use crate::error::{ApiError, Result};
use crate::routes::{cart, orders};
use crate::services::payments::verify_webhook_signature;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: Option<WebhookData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookData {
    pub payment: Option<WebhookPayment>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayment {
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
}

pub async fn gateway_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    if !verify_webhook_signature(&body, signature, &state.config.gateway.webhook_secret) {
        tracing::warn!("Webhook rejected: bad or missing signature");
        return Err(ApiError::InvalidSignature);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Malformed webhook event: {e}")))?;

    let kind = event.event.clone();
    match kind.as_str() {
        "PAYMENT_SUCCESS_WEBHOOK" | "PAYMENT_SUCCESS" => handle_success(&state, event).await?,
        "PAYMENT_FAILED_WEBHOOK" | "PAYMENT_FAILED" => handle_failure(&state, event).await?,
        other => tracing::debug!(event = other, "Ignoring webhook event"),
    }

    Ok(Json(json!({ "received": true })))
}

async fn handle_success(state: &AppState, event: WebhookEvent) -> Result<()> {
    let payment = extract_payment(event)?;
    let Some(gateway_order_id) = payment.order_id else {
        return Err(ApiError::Validation("Missing order_id in payment data".into()));
    };

    let Some(record) = find_by_gateway_id(state, &gateway_order_id).await? else {
        tracing::warn!(%gateway_order_id, "Success event for unknown gateway order");
        return Ok(());
    };

    let mut order = orders::to_aggregate(&record)?;
    match order.settle(payment.payment_id) {
        Ok(()) => {}
        Err(OrderError::AlreadyTerminal) => {
            tracing::warn!(order_id = %order.id(), "Success event for failed order ignored");
            return Ok(());
        }
    }

    sqlx::query(
        "UPDATE orders SET status = $2, gateway_payment_id = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(order.id())
    .bind(order.status().as_str())
    .bind(order.gateway_payment_id())
    .execute(&state.db)
    .await?;
    tracing::info!(order_id = %order.id(), %gateway_order_id, "Order completed");

    if matches!(order.purchase(), Purchase::Cart { .. }) {
        cart::clear_items(&state.db, order.user_id()).await?;
    }

    send_confirmation(state, &order).await;
    state.publish_events(order.take_events()).await;
    Ok(())
}

async fn handle_failure(state: &AppState, event: WebhookEvent) -> Result<()> {
    let payment = extract_payment(event)?;
    let Some(gateway_order_id) = payment.order_id else {
        return Err(ApiError::Validation("Missing order_id in payment data".into()));
    };

    let Some(record) = find_by_gateway_id(state, &gateway_order_id).await? else {
        tracing::warn!(%gateway_order_id, "Failure event for unknown gateway order");
        return Ok(());
    };

    let mut order = orders::to_aggregate(&record)?;
    match order.fail() {
        Ok(()) => {}
        Err(OrderError::AlreadyTerminal) => {
            tracing::warn!(order_id = %order.id(), "Failure event for completed order ignored");
            return Ok(());
        }
    }

    sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(order.id())
        .bind(order.status().as_str())
        .execute(&state.db)
        .await?;
    tracing::info!(order_id = %order.id(), %gateway_order_id, "Order failed");

    state.publish_events(order.take_events()).await;
    Ok(())
}

fn extract_payment(event: WebhookEvent) -> Result<WebhookPayment> {
    event
        .data
        .and_then(|d| d.payment)
        .ok_or_else(|| ApiError::Validation("Missing payment data in webhook event".into()))
}

async fn find_by_gateway_id(
    state: &AppState,
    gateway_order_id: &str,
) -> Result<Option<orders::OrderRecord>> {
    Ok(
        sqlx::query_as::<_, orders::OrderRecord>(
            "SELECT * FROM orders WHERE gateway_order_id = $1",
        )
        .bind(gateway_order_id)
        .fetch_optional(&state.db)
        .await?,
    )
}

/// Best-effort confirmation email: a send failure is logged and swallowed,
/// the order stays completed.
async fn send_confirmation(state: &AppState, order: &Order) {
    let Some(mailer) = &state.mailer else { return };

    let email: Option<(String,)> = match sqlx::query_as("SELECT email FROM users WHERE id = $1")
        .bind(order.user_id())
        .fetch_optional(&state.db)
        .await
    {
        Ok(row) => row,
        Err(e) => {
            tracing::warn!(order_id = %order.id(), error = %e, "Could not look up buyer email");
            return;
        }
    };
    let Some((email,)) = email else { return };

    let details = match order.purchase() {
        Purchase::Single { product_id, variant } => {
            let name: Option<(String,)> =
                sqlx::query_as("SELECT name FROM products WHERE id = $1")
                    .bind(product_id)
                    .fetch_optional(&state.db)
                    .await
                    .ok()
                    .flatten();
            let name = name.map_or_else(|| "Product".to_string(), |(n,)| n);
            format!("- Product: {name} ({})", variant.variant_type)
        }
        Purchase::Cart { items } => format!("- Items: {}", items.len()),
    };

    if let Err(e) = mailer
        .send_order_confirmation(&email, order.id(), &details, order.amount())
        .await
    {
        tracing::warn!(order_id = %order.id(), error = %e, "Confirmation email failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gateway_success_event() {
        let body = r#"{
            "event": "PAYMENT_SUCCESS_WEBHOOK",
            "data": { "payment": { "order_id": "ORD-00001234", "payment_id": "pay_987" } }
        }"#;
        let event: WebhookEvent = serde_json::from_str(body).unwrap();
        assert_eq!(event.event, "PAYMENT_SUCCESS_WEBHOOK");
        let payment = event.data.unwrap().payment.unwrap();
        assert_eq!(payment.order_id.as_deref(), Some("ORD-00001234"));
        assert_eq!(payment.payment_id.as_deref(), Some("pay_987"));
    }

    #[test]
    fn tolerates_missing_data_block() {
        let event: WebhookEvent = serde_json::from_str(r#"{"event": "ORDER_PING"}"#).unwrap();
        assert!(event.data.is_none());
    }
}
