//! HTTP surface: router assembly.

pub mod address;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod webhook;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/api/products/top-products", get(products::top_products))
        .route(
            "/api/products/:id",
            get(products::get_product).put(products::update_product),
        )
        .route(
            "/api/cart",
            get(cart::get_cart)
                .post(cart::add_item)
                .put(cart::update_quantity)
                .delete(cart::remove_item),
        )
        .route(
            "/api/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route("/api/orders/:id/confirm", post(orders::confirm_cod))
        .route("/api/webhook/cashfree", post(webhook::gateway_callback))
        .route(
            "/api/address",
            get(address::list_addresses).post(address::create_address),
        )
        .route(
            "/api/address/:id",
            put(address::update_address).delete(address::delete_address),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "electech-commerce" }))
}
