use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, require_admin};

use crate::handlers;

pub fn product_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_products))
        .route("/featured", get(handlers::featured_products))
        .route("/recommended", get(handlers::recommended_products))
        .route("/{id}", get(handlers::get_product));

    let customer_routes = Router::new()
        .route("/{id}/review", post(handlers::add_review))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/", post(handlers::create_product))
        .route("/{id}", put(handlers::update_product).delete(handlers::delete_product))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(customer_routes)
        .merge(admin_routes)
        .with_state(state)
}

pub fn category_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_categories))
        .route("/{id}", get(handlers::get_category));

    let admin_routes = Router::new()
        .route("/", post(handlers::create_category))
        .route("/{id}", put(handlers::update_category).delete(handlers::delete_category))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}
