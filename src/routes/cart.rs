//! Cart routes: read, add/merge, update quantity, remove.
//!
//! Every mutation rewrites the single cart document for the user
//! (last-write-wins); the aggregate owns the merge and quantity invariants.

use axum::{extract::State, Json};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::domain::aggregates::cart::{Cart, CartError, CartLine};
use crate::domain::aggregates::product::Variant;
use crate::domain::value_objects::Quantity;
use crate::error::{ApiError, Result};
use crate::state::AppState;

pub(crate) async fn load_items(db: &PgPool, user_id: Uuid) -> Result<Vec<CartLine>> {
    let row: Option<(sqlx::types::Json<Vec<CartLine>>,)> =
        sqlx::query_as("SELECT items FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    Ok(row.map(|(items,)| items.0).unwrap_or_default())
}

pub(crate) async fn save_items(db: &PgPool, user_id: Uuid, items: &[CartLine]) -> Result<()> {
    sqlx::query(
        "INSERT INTO carts (user_id, items) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW()",
    )
    .bind(user_id)
    .bind(sqlx::types::Json(items))
    .execute(db)
    .await?;
    Ok(())
}

/// Empty the line list after a successful cart checkout.
pub(crate) async fn clear_items(db: &PgPool, user_id: Uuid) -> Result<()> {
    sqlx::query("UPDATE carts SET items = '[]', updated_at = NOW() WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn get_cart(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<CartLine>>> {
    Ok(Json(load_items(&state.db, user.id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub variant: Variant,
}

pub async fn add_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<Vec<CartLine>>> {
    let quantity = Quantity::new(req.quantity).map_err(|e| ApiError::Validation(e.to_string()))?;
    let mut cart = Cart::hydrate(user.id, load_items(&state.db, user.id).await?);
    cart.add_line(req.product_id, &req.name, req.variant, quantity)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    save_items(&state.db, user.id, cart.items()).await?;
    Ok(Json(cart.into_items()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub product_id: Uuid,
    pub variant_type: String,
    pub quantity: u32,
}

pub async fn update_quantity(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<Vec<CartLine>>> {
    let quantity = Quantity::new(req.quantity).map_err(|e| ApiError::Validation(e.to_string()))?;
    let mut cart = Cart::hydrate(user.id, load_items(&state.db, user.id).await?);
    cart.set_quantity(req.product_id, &req.variant_type, quantity)
        .map_err(|e| match e {
            CartError::LineNotFound => ApiError::NotFound("Cart item".into()),
            other => ApiError::Validation(other.to_string()),
        })?;
    save_items(&state.db, user.id, cart.items()).await?;
    Ok(Json(cart.into_items()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub product_id: Uuid,
    pub variant_type: Option<String>,
}

/// Removing lines that are not present is a no-op that still returns the
/// (unchanged) list.
pub async fn remove_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<RemoveItemRequest>,
) -> Result<Json<Vec<CartLine>>> {
    let mut cart = Cart::hydrate(user.id, load_items(&state.db, user.id).await?);
    let removed = cart.remove(req.product_id, req.variant_type.as_deref());
    if removed > 0 {
        save_items(&state.db, user.id, cart.items()).await?;
    }
    Ok(Json(cart.into_items()))
}
