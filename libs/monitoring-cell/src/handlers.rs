// =====================================================================================
// MONITORING CELL HANDLERS
// =====================================================================================

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::response;

use crate::models::{AlertQuery, CleanupQuery, FrontendMetricsReport};
use crate::services::MonitoringService;

// =====================================================================================
// STATUS & METRICS
// =====================================================================================

#[instrument(skip(monitor))]
pub async fn get_status(State(monitor): State<Arc<MonitoringService>>) -> Json<Value> {
    Json(response::success("Monitoring status", monitor.status().await))
}

#[instrument(skip(monitor))]
pub async fn get_metrics(State(monitor): State<Arc<MonitoringService>>) -> Json<Value> {
    Json(response::success("Metric history", monitor.metrics_history().await))
}

#[instrument(skip(monitor))]
pub async fn collect_now(State(monitor): State<Arc<MonitoringService>>) -> Json<Value> {
    let report = monitor.collect_and_evaluate().await;
    Json(response::success("Metrics collected", report))
}

#[instrument(skip(monitor))]
pub async fn health_check(State(monitor): State<Arc<MonitoringService>>) -> Json<Value> {
    let health = monitor.check_service_health().await;
    Json(response::success("Service health checked", health))
}

#[instrument(skip(monitor, report))]
pub async fn report_frontend_metrics(
    State(monitor): State<Arc<MonitoringService>>,
    Json(report): Json<FrontendMetricsReport>,
) -> Result<Json<Value>, AppError> {
    let accepted = monitor.record_frontend_metrics(report).await?;
    Ok(Json(response::success(
        "Frontend metrics recorded",
        json!({ "accepted": accepted }),
    )))
}

// =====================================================================================
// ALERTS
// =====================================================================================

#[instrument(skip(monitor))]
pub async fn list_alerts(
    State(monitor): State<Arc<MonitoringService>>,
    Query(query): Query<AlertQuery>,
) -> Json<Value> {
    let alerts = monitor.alerts(&query).await;
    Json(json!({
        "success": true,
        "total": alerts.len(),
        "data": alerts,
    }))
}

#[instrument(skip(monitor))]
pub async fn alert_summary(State(monitor): State<Arc<MonitoringService>>) -> Json<Value> {
    Json(response::success("Open alerts by severity", monitor.alert_summary().await))
}

#[instrument(skip(monitor, user))]
pub async fn acknowledge_alert(
    State(monitor): State<Arc<MonitoringService>>,
    Extension(user): Extension<User>,
    Path(alert_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let alert = monitor.acknowledge(&alert_id, &user.email).await?;
    Ok(Json(response::success("Alert acknowledged", alert)))
}

#[instrument(skip(monitor))]
pub async fn cleanup_alerts(
    State(monitor): State<Arc<MonitoringService>>,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<Value>, AppError> {
    if query.days < 0 {
        return Err(AppError::ValidationError("days cannot be negative".to_string()));
    }

    let removed = monitor.cleanup(query.days).await?;
    info!("Alert cleanup removed {} entries", removed);
    Ok(Json(response::success(
        &format!("Removed alerts older than {} days", query.days),
        json!({ "removed": removed }),
    )))
}
