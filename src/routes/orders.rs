//! Checkout and order routes.
//!
//! Checkout resolves the amount server-side (catalog variant price, or the
//! summed cart line totals), creates a gateway order for gateway payments,
//! and persists the local record as `pending` before the buyer ever pays.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::domain::aggregates::cart::{Cart, CartLine};
use crate::domain::aggregates::order::{Order, OrderStatus, PaymentMethod, Purchase};
use crate::domain::aggregates::product::Variant;
use crate::domain::value_objects::Money;
use crate::error::{ApiError, Result};
use crate::routes::{cart, products};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub variant: Option<sqlx::types::Json<Variant>>,
    pub items: Option<sqlx::types::Json<Vec<CartLine>>>,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Present for a single-item checkout; absent to check out the cart.
    pub product_id: Option<Uuid>,
    pub variant_type: Option<String>,
    /// "gateway" (default) or "cod".
    pub payment_method: Option<String>,
}

pub async fn create_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let method = match req.payment_method.as_deref() {
        None => PaymentMethod::Gateway,
        Some(raw) => PaymentMethod::parse(raw)
            .ok_or_else(|| ApiError::Validation(format!("Unknown payment method: {raw}")))?,
    };

    let currency = state.config.currency.clone();
    let (purchase, amount) = match req.product_id {
        Some(product_id) => {
            let variant_type = req
                .variant_type
                .ok_or_else(|| ApiError::Validation("variantType is required".into()))?;
            let record = sqlx::query_as::<_, products::ProductRecord>(
                "SELECT * FROM products WHERE id = $1",
            )
            .bind(product_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or(ApiError::NotFound("Product".into()))?;
            let product = products::to_aggregate(record);
            let variant = product
                .variant(&variant_type)
                .ok_or_else(|| ApiError::Validation(format!("Unknown variant type: {variant_type}")))?
                .clone();
            let amount = Money::new(variant.price, &currency);
            (Purchase::Single { product_id, variant }, amount)
        }
        None => {
            let items = cart::load_items(&state.db, user.id).await?;
            let snapshot = Cart::hydrate(user.id, items);
            if snapshot.is_empty() {
                return Err(ApiError::Validation("Cart is empty".into()));
            }
            let amount = snapshot.total(&currency);
            (Purchase::Cart { items: snapshot.into_items() }, amount)
        }
    };

    let (gateway_order_id, payment_session_id) = match method {
        PaymentMethod::Gateway => {
            let receipt = format!("ORD-{:08}", rand::random::<u32>());
            let gateway_order = state
                .payments
                .create_order(
                    &receipt,
                    amount.amount(),
                    amount.currency(),
                    &user.id.to_string(),
                    &user.email,
                )
                .await
                .map_err(|e| ApiError::Gateway(e.to_string()))?;
            (Some(gateway_order.order_id), Some(gateway_order.payment_session_id))
        }
        PaymentMethod::CashOnDelivery => (None, None),
    };

    let mut order = Order::create_pending(user.id, purchase, amount, method, gateway_order_id);
    insert_order(&state, &order).await?;
    state.publish_events(order.take_events()).await;

    tracing::info!(order_id = %order.id(), method = method.as_str(), "Order created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "dbOrderId": order.id(),
            "orderId": order.gateway_order_id(),
            "paymentSessionId": payment_session_id,
            "amount": order.amount().amount(),
            "currency": order.amount().currency(),
        })),
    ))
}

pub async fn list_orders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<OrderRecord>>> {
    let orders = sqlx::query_as::<_, OrderRecord>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(orders))
}

/// Server-confirmed completion for cash-on-delivery orders (admin only).
/// Gateway-paid orders are settled by the webhook, never here.
pub async fn confirm_cod(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderRecord>> {
    user.require_admin()?;
    let record = sqlx::query_as::<_, OrderRecord>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Order".into()))?;

    let mut order = to_aggregate(&record)?;
    if order.payment_method() != PaymentMethod::CashOnDelivery {
        return Err(ApiError::Validation(
            "Only cash-on-delivery orders can be confirmed manually".into(),
        ));
    }
    order
        .settle(None)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let updated = sqlx::query_as::<_, OrderRecord>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(order.id())
    .bind(order.status().as_str())
    .fetch_one(&state.db)
    .await?;
    state.publish_events(order.take_events()).await;

    tracing::info!(order_id = %order.id(), "Cash-on-delivery order confirmed");
    Ok(Json(updated))
}

async fn insert_order(state: &AppState, order: &Order) -> Result<()> {
    let (product_id, variant, items) = match order.purchase() {
        Purchase::Single { product_id, variant } => {
            (Some(*product_id), Some(sqlx::types::Json(variant.clone())), None)
        }
        Purchase::Cart { items } => (None, None, Some(sqlx::types::Json(items.clone()))),
    };
    sqlx::query(
        "INSERT INTO orders (id, user_id, product_id, variant, items, gateway_order_id, \
         gateway_payment_id, amount, currency, payment_method, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(order.id())
    .bind(order.user_id())
    .bind(product_id)
    .bind(variant)
    .bind(items)
    .bind(order.gateway_order_id())
    .bind(order.gateway_payment_id())
    .bind(order.amount().amount())
    .bind(order.amount().currency())
    .bind(order.payment_method().as_str())
    .bind(order.status().as_str())
    .bind(order.created_at())
    .bind(order.updated_at())
    .execute(&state.db)
    .await?;
    Ok(())
}

/// Rebuild the order aggregate from a stored row.
pub(crate) fn to_aggregate(record: &OrderRecord) -> Result<Order> {
    let purchase = match (&record.items, record.product_id, &record.variant) {
        (Some(items), _, _) => Purchase::Cart { items: items.0.clone() },
        (None, Some(product_id), Some(variant)) => {
            Purchase::Single { product_id, variant: variant.0.clone() }
        }
        _ => return Err(ApiError::Internal(format!("Order {} has no purchase data", record.id))),
    };
    let status = OrderStatus::parse(&record.status)
        .ok_or_else(|| ApiError::Internal(format!("Order {} has status {}", record.id, record.status)))?;
    let method = PaymentMethod::parse(&record.payment_method).ok_or_else(|| {
        ApiError::Internal(format!("Order {} has payment method {}", record.id, record.payment_method))
    })?;
    Ok(Order::hydrate(
        record.id,
        record.user_id,
        purchase,
        record.gateway_order_id.clone(),
        record.gateway_payment_id.clone(),
        Money::new(record.amount, &record.currency),
        method,
        status,
        record.created_at,
        record.updated_at,
    ))
}
