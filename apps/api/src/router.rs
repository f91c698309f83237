use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    middleware,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use auth_cell::router::auth_routes;
use cart_cell::router::cart_routes;
use catalog_cell::router::{category_routes, product_routes};
use feedback_cell::feedback_routes;
use monitoring_cell::{monitoring_routes, track_requests, MonitoringService};
use order_cell::router::order_routes;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

pub fn create_router(state: Arc<AppConfig>, monitor: Arc<MonitoringService>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state.clone())
        .nest("/api/auth", auth_routes(state.clone()))
        .nest("/api/products", product_routes(state.clone()))
        .nest("/api/categories", category_routes(state.clone()))
        .nest("/api/cart", cart_routes(state.clone()))
        .nest("/api/orders", order_routes(state.clone()))
        .nest("/api/feedback", feedback_routes(state.clone(), monitor.dispatcher()))
        .nest("/api/monitoring", monitoring_routes(state.clone(), monitor.clone()))
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(monitor.tracker(), track_requests))
}

async fn health_check(State(config): State<Arc<AppConfig>>) -> Json<Value> {
    let database = match SupabaseClient::new(&config).ping().await {
        Ok(_) => "up",
        Err(e) => {
            warn!("Health check: database unreachable: {}", e);
            "down"
        }
    };

    Json(json!({
        "status": "ok",
        "message": "Shop API is running",
        "timestamp": Utc::now(),
        "database": database,
        "service": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn route_not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": format!("Route not found: {}", uri.path())
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use monitoring_cell::MonitoringConfig;
    use shared_utils::test_utils::TestConfig;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<MonitoringService>) {
        let config = TestConfig::offline().to_arc();
        let monitor = Arc::new(MonitoringService::new(&config, MonitoringConfig::default()));
        (create_router(config, monitor.clone()), monitor)
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_reports_offline_database() {
        let (app, _) = app();

        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "down");
        assert_eq!(body["service"]["name"], "shop-api");
    }

    #[tokio::test]
    async fn unknown_routes_return_json_404() {
        let (app, _) = app();

        let response = app
            .oneshot(Request::builder().uri("/api/unknown").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = read_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Route not found: /api/unknown");
    }

    #[tokio::test]
    async fn requests_are_tracked_for_monitoring() {
        let (app, monitor) = app();

        app.clone()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        app.oneshot(Request::builder().uri("/api/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let window = monitor.tracker().take_window();
        assert_eq!(window.requests, 2);
        assert_eq!(window.errors, 1);
    }

    #[tokio::test]
    async fn catalog_falls_back_when_store_is_offline() {
        let (app, _) = app();

        let response = app
            .oneshot(Request::builder().uri("/api/products").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
