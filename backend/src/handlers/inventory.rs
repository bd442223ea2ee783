//! HTTP handlers for inventory management

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
    services::inventory::{
        CreateItemInput, InventoryService, RecordMovementInput, UpdateItemInput,
    },
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Create an inventory item
pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<CreateItemInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "inventory", "create")?;
    let service = InventoryService::new(state.db);
    let item = service.create_item(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Get an inventory item by ID
pub async fn get_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(item_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "inventory", "view")?;
    let service = InventoryService::new(state.db);
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// List inventory items
pub async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ItemListQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "inventory", "view")?;
    let service = InventoryService::new(state.db);
    let items = service.list_items(query.include_inactive).await?;
    Ok(Json(items))
}

/// Update an inventory item
pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "inventory", "edit")?;
    let service = InventoryService::new(state.db);
    let item = service.update_item(item_id, input).await?;
    Ok(Json(item))
}

/// Record a stock movement
pub async fn record_movement(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<RecordMovementInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "inventory", "create")?;
    let service = InventoryService::new(state.db);
    let movement = service.record_movement(user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// Movement history for one item
pub async fn list_movements(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(item_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "inventory", "view")?;
    let service = InventoryService::new(state.db);
    let movements = service.list_movements(item_id).await?;
    Ok(Json(movements))
}

/// Current balance for one item
pub async fn get_balance(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(item_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "inventory", "view")?;
    let service = InventoryService::new(state.db);
    let balance = service.get_balance(item_id).await?;
    Ok(Json(balance))
}

/// Items below their minimum stock level
pub async fn low_stock(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "inventory", "view")?;
    let service = InventoryService::new(state.db);
    let items = service.low_stock().await?;
    Ok(Json(items))
}
