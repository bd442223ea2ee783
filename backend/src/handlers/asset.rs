//! HTTP handlers for fixed assets

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::{check_permission, CurrentUser},
    services::asset::{AssetService, CreateAssetInput},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct DepreciationRunRequest {
    pub year: i32,
    pub month: u32,
}

/// Register a fixed asset
pub async fn create_asset(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<CreateAssetInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "create")?;
    let service = AssetService::new(state.db);
    let asset = service.create_asset(input).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// Get an asset by ID
pub async fn get_asset(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(asset_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = AssetService::new(state.db);
    let asset = service.get_asset(asset_id).await?;
    Ok(Json(asset))
}

/// List assets
pub async fn list_assets(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = AssetService::new(state.db);
    let assets = service.list_assets().await?;
    Ok(Json(assets))
}

/// Retire an asset
pub async fn retire_asset(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(asset_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "edit")?;
    let service = AssetService::new(state.db);
    let asset = service.retire_asset(asset_id).await?;
    Ok(Json(asset))
}

/// Run monthly depreciation across active assets
pub async fn run_depreciation(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<DepreciationRunRequest>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "create")?;
    let service = AssetService::new(state.db);
    let run = service.run_depreciation(request.year, request.month).await?;
    Ok(Json(run))
}
