//! HTTP handlers for ledger reports

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::{check_permission, CurrentUser},
    services::LedgerService,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct TrialBalanceQuery {
    pub as_of: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Trial balance over posted entries up to a date
pub async fn trial_balance(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<TrialBalanceQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = LedgerService::new(state.db);
    let report = service.trial_balance(query.as_of).await?;
    Ok(Json(report))
}

/// General ledger for one account over a date window
pub async fn general_ledger(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = LedgerService::new(state.db);
    let report = service
        .general_ledger(account_id, query.from, query.to)
        .await?;
    Ok(Json(report))
}
