use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::response;

use crate::models::{AdminOrderQuery, CreateOrderRequest, PayOrderRequest, UpdateStatusRequest};
use crate::services::OrderService;

// ==============================================================================
// CUSTOMER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn place_order(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = OrderService::new(&config);
    let order = service.place_order(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(response::success("Order placed successfully", order)),
    ))
}

#[axum::debug_handler]
pub async fn my_orders(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = OrderService::new(&config);
    let orders = service.list_for_user(&user.id).await?;

    Ok(Json(response::success("Orders retrieved", orders)))
}

#[axum::debug_handler]
pub async fn get_order(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = OrderService::new(&config);
    let order = service.get_order(&user, &order_id).await?;

    Ok(Json(response::success("Order retrieved", order)))
}

#[axum::debug_handler]
pub async fn cancel_order(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = OrderService::new(&config);
    let order = service.cancel_order(&user, &order_id).await?;

    Ok(Json(response::success("Order cancelled", order)))
}

#[axum::debug_handler]
pub async fn pay_order(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(order_id): Path<String>,
    Json(payment): Json<PayOrderRequest>,
) -> Result<Json<Value>, AppError> {
    let service = OrderService::new(&config);
    let order = service.pay_order(&user, &order_id, payment).await?;

    Ok(Json(response::success("Payment recorded", order)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn all_orders(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<AdminOrderQuery>,
) -> Result<Json<Value>, AppError> {
    let service = OrderService::new(&config);
    let orders = service.list_all(query.status.as_deref()).await?;

    Ok(Json(response::success("Orders retrieved", orders)))
}

#[axum::debug_handler]
pub async fn update_order_status(
    State(config): State<Arc<AppConfig>>,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = OrderService::new(&config);
    let order = service.update_status(&order_id, request).await?;

    Ok(Json(response::success("Order status updated", order)))
}
