use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::response;

use crate::models::{
    CatalogRead, CreateCategoryRequest, CreateProductRequest, ProductQuery, ReviewRequest,
    UpdateCategoryRequest, UpdateProductRequest,
};
use crate::services::{CategoryService, ProductService};

const FALLBACK_MESSAGE: &str = "Database unavailable, serving mock data";

fn catalog_response<T: Serialize>(read: CatalogRead<T>) -> Json<Value> {
    if read.fallback {
        let mut body = response::success(FALLBACK_MESSAGE, read.data);
        body["fallback"] = json!(true);
        Json(body)
    } else {
        Json(response::success("Success", read.data))
    }
}

// ==============================================================================
// PRODUCTS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_products(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(&config);
    Ok(catalog_response(service.list_products(&query).await?))
}

#[axum::debug_handler]
pub async fn featured_products(State(config): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(&config);
    Ok(catalog_response(service.featured_products().await?))
}

#[axum::debug_handler]
pub async fn recommended_products(State(config): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(&config);
    Ok(catalog_response(service.recommended_products().await?))
}

#[axum::debug_handler]
pub async fn get_product(
    State(config): State<Arc<AppConfig>>,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(&config);
    Ok(catalog_response(service.get_product(&product_id).await?))
}

#[axum::debug_handler]
pub async fn add_review(
    State(config): State<Arc<AppConfig>>,
    Path(product_id): Path<String>,
    Extension(user): Extension<User>,
    Json(request): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ProductService::new(&config);
    let product = service.add_review(&product_id, &user.id, request).await?;

    Ok((StatusCode::CREATED, Json(response::success("Review added", product))))
}

#[axum::debug_handler]
pub async fn create_product(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ProductService::new(&config);
    let product = service.create_product(request).await?;

    Ok((StatusCode::CREATED, Json(response::success("Product created", product))))
}

#[axum::debug_handler]
pub async fn update_product(
    State(config): State<Arc<AppConfig>>,
    Path(product_id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(&config);
    let product = service.update_product(&product_id, request).await?;

    Ok(Json(response::success("Product updated", product)))
}

#[axum::debug_handler]
pub async fn delete_product(
    State(config): State<Arc<AppConfig>>,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(&config);
    service.delete_product(&product_id).await?;

    Ok(Json(response::message("Product deleted")))
}

// ==============================================================================
// CATEGORIES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_categories(State(config): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let service = CategoryService::new(&config);
    Ok(catalog_response(service.list_categories().await?))
}

#[axum::debug_handler]
pub async fn get_category(
    State(config): State<Arc<AppConfig>>,
    Path(category_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = CategoryService::new(&config);
    Ok(catalog_response(service.get_category(&category_id).await?))
}

#[axum::debug_handler]
pub async fn create_category(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = CategoryService::new(&config);
    let category = service.create_category(request).await?;

    Ok((StatusCode::CREATED, Json(response::success("Category created", category))))
}

#[axum::debug_handler]
pub async fn update_category(
    State(config): State<Arc<AppConfig>>,
    Path(category_id): Path<String>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<Value>, AppError> {
    let service = CategoryService::new(&config);
    let category = service.update_category(&category_id, request).await?;

    Ok(Json(response::success("Category updated", category)))
}

#[axum::debug_handler]
pub async fn delete_category(
    State(config): State<Arc<AppConfig>>,
    Path(category_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = CategoryService::new(&config);
    service.delete_category(&category_id).await?;

    Ok(Json(response::message("Category deleted")))
}
