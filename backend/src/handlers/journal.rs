//! HTTP handlers for journal entries

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
    services::journal::{CreateEntryInput, JournalService, VoidEntryInput},
    AppState,
};
use shared::models::JournalStatus;

#[derive(Debug, Deserialize)]
pub struct EntryListQuery {
    pub status: Option<JournalStatus>,
}

/// Create a journal entry in draft
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<CreateEntryInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "create")?;
    let service = JournalService::new(state.db);
    let entry = service.create_entry(input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Get a journal entry with its lines
pub async fn get_entry(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = JournalService::new(state.db);
    let entry = service.get_entry(entry_id).await?;
    Ok(Json(entry))
}

/// List journal entries, optionally by status
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<EntryListQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = JournalService::new(state.db);
    let entries = service.list_entries(query.status).await?;
    Ok(Json(entries))
}

/// Post a draft entry to the ledger
pub async fn post_entry(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "edit")?;
    let service = JournalService::new(state.db);
    let entry = service.post_entry(entry_id).await?;
    Ok(Json(entry))
}

/// Void a posted entry by creating a reversing entry
pub async fn void_entry(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(entry_id): Path<Uuid>,
    Json(input): Json<VoidEntryInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "edit")?;
    let service = JournalService::new(state.db);
    let entry = service.void_entry(entry_id, input).await?;
    Ok(Json(entry))
}
