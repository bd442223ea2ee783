//! HTTP handlers for financial periods

use axum::{extract::State, response::IntoResponse, Extension, Json};

use crate::{
    error::AppResult,
    middleware::{check_permission, CurrentUser},
    services::period::{PeriodInput, PeriodService},
    AppState,
};

/// List financial periods, newest first
pub async fn list_periods(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = PeriodService::new(state.db);
    let periods = service.list_periods().await?;
    Ok(Json(periods))
}

/// Close a period; posted entries in it become final
pub async fn close_period(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<PeriodInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "edit")?;
    let service = PeriodService::new(state.db);
    let period = service.close_period(input).await?;
    Ok(Json(period))
}

/// Reopen a closed period
pub async fn reopen_period(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<PeriodInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "edit")?;
    let service = PeriodService::new(state.db);
    let period = service.reopen_period(input).await?;
    Ok(Json(period))
}
