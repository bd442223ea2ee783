//! HTTP handlers for order management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::{check_permission, CurrentUser},
    services::order::{DownPaymentInput, OrderFilter, OrderService, UpdateOrderInput},
    AppState,
};
use shared::models::CreateOrderInput;

#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

/// Create an order with a fresh SPK number
pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "order", "create")?;
    let service = OrderService::new(state.db);
    let order = service.create_order(user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Get an order with its items
pub async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "order", "view")?;
    let service = OrderService::new(state.db);
    let order = service.get_order(order_id).await?;
    Ok(Json(order))
}

/// List orders with optional filters
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<OrderFilter>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "order", "view")?;
    let service = OrderService::new(state.db);
    let orders = service.list_orders(filter).await?;
    Ok(Json(orders))
}

/// Update a draft order
pub async fn update_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "order", "edit")?;
    let service = OrderService::new(state.db);
    let order = service.update_order(order_id, input).await?;
    Ok(Json(order))
}

/// Cancel an order that is not yet completed
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<CancelOrderRequest>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "order", "edit")?;
    let service = OrderService::new(state.db);
    let order = service
        .cancel_order(order_id, user.0.user_id, request.reason)
        .await?;
    Ok(Json(order))
}

/// Record a customer down payment against an order
pub async fn record_down_payment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<DownPaymentInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "create")?;
    let service = OrderService::new(state.db);
    let order = service.record_down_payment(order_id, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
