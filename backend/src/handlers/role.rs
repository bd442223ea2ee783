//! HTTP handlers for roles and user administration

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
    services::role::{CreateRoleInput, RoleService, UpdateRoleInput},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: Uuid,
}

/// List all roles
pub async fn list_roles(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "role", "view")?;
    let service = RoleService::new(state.db);
    let roles = service.list_roles().await?;
    Ok(Json(roles))
}

/// Get a role by ID
pub async fn get_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(role_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "role", "view")?;
    let service = RoleService::new(state.db);
    let role = service.get_role(role_id).await?;
    Ok(Json(role))
}

/// Create a custom role
pub async fn create_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<CreateRoleInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "role", "create")?;
    let service = RoleService::new(state.db);
    let role = service.create_role(input).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// Update a custom role
pub async fn update_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(role_id): Path<Uuid>,
    Json(input): Json<UpdateRoleInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "role", "edit")?;
    let service = RoleService::new(state.db);
    let role = service.update_role(role_id, input).await?;
    Ok(Json(role))
}

/// Delete a custom role with no users assigned
pub async fn delete_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(role_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "role", "delete")?;
    let service = RoleService::new(state.db);
    service.delete_role(role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List user accounts
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "user", "view")?;
    let service = RoleService::new(state.db);
    let users = service.list_users().await?;
    Ok(Json(users))
}

/// Assign a user to a role
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AssignRoleRequest>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "user", "edit")?;
    let service = RoleService::new(state.db);
    let updated = service.assign_role(user_id, request.role_id).await?;
    Ok(Json(updated))
}

/// Deactivate a user account
pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "user", "delete")?;
    let service = RoleService::new(state.db);
    service.deactivate_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
