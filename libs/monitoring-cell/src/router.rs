// =====================================================================================
// MONITORING CELL ROUTER
// =====================================================================================

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, require_admin};

use crate::handlers;
use crate::services::MonitoringService;

pub fn monitoring_routes(config: Arc<AppConfig>, monitor: Arc<MonitoringService>) -> Router {
    let public_routes = Router::new()
        .route("/frontend-metrics", post(handlers::report_frontend_metrics));

    let admin_routes = Router::new()
        .route("/status", get(handlers::get_status))
        .route("/metrics", get(handlers::get_metrics))
        .route("/alerts", get(handlers::list_alerts))
        .route("/alerts/summary", get(handlers::alert_summary))
        .route("/alerts/cleanup", delete(handlers::cleanup_alerts))
        .route("/alerts/{id}/acknowledge", post(handlers::acknowledge_alert))
        .route("/collect", post(handlers::collect_now))
        .route("/health-check", post(handlers::health_check))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(monitor)
}
