//! HTTP handlers for vendors and bills

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
    services::bill::{BillPaymentInput, BillService, CreateBillInput, VendorInput},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct BillListQuery {
    #[serde(default)]
    pub outstanding_only: bool,
}

/// Register a vendor
pub async fn create_vendor(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<VendorInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "create")?;
    let service = BillService::new(state.db);
    let vendor = service.create_vendor(input).await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}

/// List active vendors
pub async fn list_vendors(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = BillService::new(state.db);
    let vendors = service.list_vendors().await?;
    Ok(Json(vendors))
}

/// Update a vendor
pub async fn update_vendor(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(vendor_id): Path<Uuid>,
    Json(input): Json<VendorInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "edit")?;
    let service = BillService::new(state.db);
    let vendor = service.update_vendor(vendor_id, input).await?;
    Ok(Json(vendor))
}

/// Deactivate a vendor
pub async fn deactivate_vendor(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(vendor_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "delete")?;
    let service = BillService::new(state.db);
    service.deactivate_vendor(vendor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a vendor bill
pub async fn create_bill(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<CreateBillInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "create")?;
    let service = BillService::new(state.db);
    let bill = service.create_bill(input).await?;
    Ok((StatusCode::CREATED, Json(bill)))
}

/// Get a bill by ID
pub async fn get_bill(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(bill_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = BillService::new(state.db);
    let bill = service.get_bill(bill_id).await?;
    Ok(Json(bill))
}

/// List bills, optionally only outstanding ones
pub async fn list_bills(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<BillListQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = BillService::new(state.db);
    let bills = service.list_bills(query.outstanding_only).await?;
    Ok(Json(bills))
}

/// Pay a bill
pub async fn pay_bill(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(bill_id): Path<Uuid>,
    Json(input): Json<BillPaymentInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "create")?;
    let service = BillService::new(state.db);
    let bill = service.pay_bill(bill_id, input).await?;
    Ok((StatusCode::CREATED, Json(bill)))
}
