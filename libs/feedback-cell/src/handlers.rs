use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use shared_models::error::AppError;
use shared_models::response;

use crate::models::{
    ExportQuery, FeedbackListQuery, StatsQuery, SubmitFeedbackRequest, UpdateFeedbackStatusRequest,
};
use crate::router::FeedbackState;
use crate::services::{export, FeedbackService};
use crate::validation::client_ip;

fn service(state: &FeedbackState) -> FeedbackService {
    FeedbackService::new(&state.config, state.dispatcher.clone())
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn submit_feedback(
    State(state): State<FeedbackState>,
    headers: HeaderMap,
    Json(request): Json<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let feedback = service(&state).submit(request, client_ip(&headers)).await?;

    Ok((
        StatusCode::CREATED,
        Json(response::success(
            "Thank you for your feedback",
            json!({ "feedbackId": feedback.id }),
        )),
    ))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn feedback_stats(
    State(state): State<FeedbackState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Value>, AppError> {
    let stats = service(&state).stats(&query).await?;

    Ok(Json(response::success("Feedback statistics", stats)))
}

#[axum::debug_handler]
pub async fn list_feedback(
    State(state): State<FeedbackState>,
    Query(query): Query<FeedbackListQuery>,
) -> Result<Json<Value>, AppError> {
    let page = service(&state).list(&query).await?;

    Ok(Json(response::success("Feedback retrieved", page)))
}

#[axum::debug_handler]
pub async fn get_feedback(
    State(state): State<FeedbackState>,
    Path(feedback_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let feedback = service(&state).get(&feedback_id).await?;

    Ok(Json(response::success("Feedback retrieved", feedback)))
}

#[axum::debug_handler]
pub async fn update_feedback_status(
    State(state): State<FeedbackState>,
    Path(feedback_id): Path<String>,
    Json(request): Json<UpdateFeedbackStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let feedback = service(&state).update_status(&feedback_id, request).await?;

    Ok(Json(response::success("Feedback status updated", feedback)))
}

#[axum::debug_handler]
pub async fn export_feedback(
    State(state): State<FeedbackState>,
    Query(query): Query<ExportQuery>,
) -> Result<([(HeaderName, String); 2], String), AppError> {
    let csv = service(&state).export(&query).await?;
    let disposition = format!("attachment; filename=\"{}\"", export::export_filename(Utc::now()));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
