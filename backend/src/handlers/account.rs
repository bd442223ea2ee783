//! HTTP handlers for the chart of accounts

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
    services::account::{AccountService, CreateAccountInput, UpdateAccountInput},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct AccountListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Create an account
pub async fn create_account(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<CreateAccountInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "create")?;
    let service = AccountService::new(state.db);
    let account = service.create_account(input).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Get an account by ID
pub async fn get_account(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(account_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = AccountService::new(state.db);
    let account = service.get_account(account_id).await?;
    Ok(Json(account))
}

/// List accounts ordered by code
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<AccountListQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = AccountService::new(state.db);
    let accounts = service.list_accounts(query.include_inactive).await?;
    Ok(Json(accounts))
}

/// Update an account
pub async fn update_account(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(account_id): Path<Uuid>,
    Json(input): Json<UpdateAccountInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "edit")?;
    let service = AccountService::new(state.db);
    let account = service.update_account(account_id, input).await?;
    Ok(Json(account))
}

/// Delete an account that has never been journaled
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(account_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "delete")?;
    let service = AccountService::new(state.db);
    service.delete_account(account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
