use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::Value;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::response;

use crate::models::{AddToCartRequest, UpdateCartItemRequest};
use crate::services::CartService;

#[axum::debug_handler]
pub async fn get_cart(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = CartService::new(&config);
    let cart = service.get_cart(&user.id).await?;

    let message = if cart.items.is_empty() { "Cart is empty" } else { "Cart loaded" };
    Ok(Json(response::success(message, cart)))
}

#[axum::debug_handler]
pub async fn add_to_cart(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<Value>, AppError> {
    let service = CartService::new(&config);
    let cart = service.add_item(&user.id, request).await?;

    Ok(Json(response::success("Item added to cart", cart)))
}

#[axum::debug_handler]
pub async fn update_cart_item(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<Value>, AppError> {
    let service = CartService::new(&config);
    let cart = service.update_item(&user.id, request).await?;

    Ok(Json(response::success("Cart item updated", cart)))
}

#[axum::debug_handler]
pub async fn remove_from_cart(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(item_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = CartService::new(&config);
    let cart = service.remove_item(&user.id, &item_id).await?;

    Ok(Json(response::success("Item removed from cart", cart)))
}

#[axum::debug_handler]
pub async fn clear_cart(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = CartService::new(&config);
    let cart = service.clear_cart(&user.id).await?;

    Ok(Json(response::success("Cart cleared", cart)))
}
