use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use monitoring_cell::NotificationDispatcher;
use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, require_admin};

use crate::handlers;

#[derive(Clone)]
pub struct FeedbackState {
    pub config: Arc<AppConfig>,
    pub dispatcher: Arc<NotificationDispatcher>,
}

pub fn feedback_routes(config: Arc<AppConfig>, dispatcher: Arc<NotificationDispatcher>) -> Router {
    let public_routes = Router::new().route("/submit", post(handlers::submit_feedback));

    let admin_routes = Router::new()
        .route("/stats", get(handlers::feedback_stats))
        .route("/list", get(handlers::list_feedback))
        .route("/export", get(handlers::export_feedback))
        .route("/{id}", get(handlers::get_feedback))
        .route("/{id}/status", put(handlers::update_feedback_status))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(FeedbackState { config, dispatcher })
}
