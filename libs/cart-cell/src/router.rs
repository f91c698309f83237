use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn cart_routes(state: Arc<AppConfig>) -> Router {
    // "/clear" is a static segment and wins over "/{item_id}"
    Router::new()
        .route("/", get(handlers::get_cart))
        .route("/add", post(handlers::add_to_cart))
        .route("/update", put(handlers::update_cart_item))
        .route("/clear", delete(handlers::clear_cart))
        .route("/{item_id}", delete(handlers::remove_from_cart))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
