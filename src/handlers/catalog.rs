use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{CreatePolicy, CreateProduct, CreateProductItem, UpdateItemStatus, UpdateProduct},
    AppState,
};

// ── Products ──────────────────────────────────────────────────────────────────

pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let products = state.catalog.list_products().await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": products,
            "count": products.len(),
        })),
    ))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let product = state.catalog.add_product(&payload).await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "data": product }))))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProduct>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let product = state.catalog.update_product(id, &payload).await?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "data": product }))))
}

// ── Product items ─────────────────────────────────────────────────────────────

pub async fn list_items(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let items = state.catalog.list_items(product_id).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": items,
            "count": items.len(),
        })),
    ))
}

pub async fn create_item(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(payload): Json<CreateProductItem>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let item = state.catalog.add_item(product_id, &payload).await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "data": item }))))
}

pub async fn update_item_status(
    State(state): State<AppState>,
    Path(serial_number): Path<String>,
    Json(payload): Json<UpdateItemStatus>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let item = state
        .catalog
        .update_item_status(&serial_number, payload.status)
        .await?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "data": item }))))
}

// ── Policies ──────────────────────────────────────────────────────────────────

pub async fn list_policies(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let policies = state.catalog.list_policies(product_id).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": policies,
            "count": policies.len(),
        })),
    ))
}

pub async fn create_policy(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(payload): Json<CreatePolicy>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let policy = state.catalog.add_policy(product_id, &payload).await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "data": policy }))))
}
