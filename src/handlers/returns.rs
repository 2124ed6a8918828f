use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    error::AppResult,
    models::{CloseReturnRequest, OpenReturnRequest, TechnicalReview, UpdateSerialNumber},
    AppState,
};

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn open_return_request(
    State(state): State<AppState>,
    Json(payload): Json<OpenReturnRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let request = state.returns.open_return_request(&payload).await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "data": request }))))
}

pub async fn update_serial_number(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSerialNumber>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let request = state
        .returns
        .update_user_serial_number(id, &payload.serial_number)
        .await?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "data": request }))))
}

pub async fn technical_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TechnicalReview>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let request = state.returns.technical_review(id, &payload).await?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "data": request }))))
}

pub async fn close_return_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CloseReturnRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let request = state
        .returns
        .close_return_request(payload.closed_by, id, payload.feedback)
        .await?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "data": request }))))
}

// ── Queries ───────────────────────────────────────────────────────────────────

pub async fn list_return_requests(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let requests = state.returns.get_all_return_requests().await?;

    info!(count = requests.len(), "Listed open return requests");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": requests,
            "count": requests.len(),
        })),
    ))
}

pub async fn list_user_return_requests(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let requests = state.returns.get_all_user_return_requests(user_id).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": requests,
            "count": requests.len(),
        })),
    ))
}

pub async fn get_return_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let request = state.returns.get_return_request(id).await?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "data": request }))))
}
