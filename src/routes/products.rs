//! Catalog routes. Reads are public; writes require the admin role.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::domain::aggregates::product::{Product, Variant};
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image_url: Vec<String>,
    pub variants: sqlx::types::Json<Vec<Variant>>,
    pub is_top_product: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<ProductRecord>>> {
    let page = p.page.unwrap_or(1).max(1);
    let per_page = p.per_page.unwrap_or(20).min(100);
    let products = sqlx::query_as::<_, ProductRecord>(
        "SELECT * FROM products ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(i64::from(per_page))
    .bind(i64::from((page - 1) * per_page))
    .fetch_all(&state.db)
    .await?;
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&state.db)
        .await?;
    let data = products
        .into_iter()
        .map(|record| resolve_images(record, &state))
        .collect();
    Ok(Json(PaginatedResponse { data, total: total.0, page }))
}

pub async fn top_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductRecord>>> {
    let products = sqlx::query_as::<_, ProductRecord>(
        "SELECT * FROM products WHERE is_top_product ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(products.into_iter().map(|record| resolve_images(record, &state)).collect()))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductRecord>> {
    sqlx::query_as::<_, ProductRecord>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(|record| Json(resolve_images(record, &state)))
        .ok_or(ApiError::NotFound("Product".into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: String,
    pub description: String,
    pub image_url: Vec<String>,
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub is_top_product: bool,
}

pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ProductPayload>,
) -> Result<(StatusCode, Json<ProductRecord>)> {
    user.require_admin()?;
    let product = Product::create(
        req.name,
        req.description,
        req.image_url,
        req.variants,
        req.is_top_product,
    )
    .map_err(|e| ApiError::Validation(e.to_string()))?;

    let record = insert_product(&state, &product).await?;
    Ok((StatusCode::CREATED, Json(resolve_images(record, &state))))
}

pub async fn update_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductPayload>,
) -> Result<Json<ProductRecord>> {
    user.require_admin()?;
    let existing = sqlx::query_as::<_, ProductRecord>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Product".into()))?;

    let mut product = to_aggregate(existing);
    product
        .update(req.name, req.description, req.image_url, req.variants, req.is_top_product)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let record = sqlx::query_as::<_, ProductRecord>(
        "UPDATE products SET name = $2, description = $3, image_url = $4, variants = $5, \
         is_top_product = $6, updated_at = $7 WHERE id = $1 RETURNING *",
    )
    .bind(product.id())
    .bind(product.name())
    .bind(product.description())
    .bind(product.image_url().to_vec())
    .bind(sqlx::types::Json(product.variants().to_vec()))
    .bind(product.is_top_product())
    .bind(product.updated_at())
    .fetch_one(&state.db)
    .await?;
    Ok(Json(resolve_images(record, &state)))
}

async fn insert_product(state: &AppState, product: &Product) -> Result<ProductRecord> {
    let record = sqlx::query_as::<_, ProductRecord>(
        "INSERT INTO products (id, name, description, image_url, variants, is_top_product, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(product.id())
    .bind(product.name())
    .bind(product.description())
    .bind(product.image_url().to_vec())
    .bind(sqlx::types::Json(product.variants().to_vec()))
    .bind(product.is_top_product())
    .bind(product.created_at())
    .bind(product.updated_at())
    .fetch_one(&state.db)
    .await?;
    Ok(record)
}

/// Resolve stored image filenames against the configured image host.
fn resolve_images(mut record: ProductRecord, state: &AppState) -> ProductRecord {
    if let Some(base) = &state.config.image_host_url {
        let base = base.trim_end_matches('/');
        record.image_url = record
            .image_url
            .iter()
            .map(|file| format!("{base}/{file}"))
            .collect();
    }
    record
}

pub(crate) fn to_aggregate(record: ProductRecord) -> Product {
    Product::hydrate(
        record.id,
        record.name,
        record.description,
        record.image_url,
        record.variants.0,
        record.is_top_product,
        record.created_at,
        record.updated_at,
    )
}
