use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::response;

use crate::models::{
    ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest, UpdateProfileRequest,
};
use crate::services::UserService;

#[axum::debug_handler]
pub async fn register(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = UserService::new(&config);
    let auth = service.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(response::success("Registration successful", auth)),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&config);
    let auth = service.login(request).await?;

    Ok(Json(response::success("Login successful", auth)))
}

pub async fn logout() -> Json<Value> {
    Json(response::message("Logged out"))
}

/// Takes the token from the body, falling back to the bearer header.
#[axum::debug_handler]
pub async fn refresh(
    State(config): State<Arc<AppConfig>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<Value>, AppError> {
    let presented = request
        .token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| bearer.map(|TypedHeader(auth)| auth.token().to_string()))
        .ok_or_else(|| AppError::ValidationError("token is required".to_string()))?;

    let service = UserService::new(&config);
    let token = service.refresh(&presented)?;

    Ok(Json(response::success("Token refreshed", json!({ "token": token }))))
}

#[axum::debug_handler]
pub async fn me(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    debug!("Getting profile for user: {}", user.id);

    let service = UserService::new(&config);
    let profile = service.current_profile(&user.id).await?;

    Ok(Json(response::success("Profile loaded", profile)))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&config);
    let profile = service.update_profile(&user.id, request).await?;

    Ok(Json(response::success("Profile updated", profile)))
}

#[axum::debug_handler]
pub async fn change_password(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&config);
    service.change_password(&user.id, request).await?;

    Ok(Json(response::message("Password changed")))
}
