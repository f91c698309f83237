use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, require_admin};

use crate::handlers;

pub fn order_routes(state: Arc<AppConfig>) -> Router {
    let customer_routes = Router::new()
        .route("/", get(handlers::my_orders).post(handlers::place_order))
        .route("/{id}", get(handlers::get_order))
        .route("/{id}/cancel", put(handlers::cancel_order))
        .route("/{id}/pay", put(handlers::pay_order))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/admin/all", get(handlers::all_orders))
        .route("/{id}/status", put(handlers::update_order_status))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(customer_routes)
        .merge(admin_routes)
        .with_state(state)
}
