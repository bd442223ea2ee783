//! HTTP handlers for invoices

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
    services::invoice::{
        InvoicePaymentInput, InvoiceService, IssueInvoiceInput, VoidInvoiceInput,
    },
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct InvoiceListQuery {
    #[serde(default)]
    pub outstanding_only: bool,
}

/// Issue an invoice from an order
pub async fn issue_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<IssueInvoiceInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "create")?;
    let service = InvoiceService::new(state.db);
    let invoice = service.issue_from_order(input).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Get an invoice by ID
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = InvoiceService::new(state.db);
    let invoice = service.get_invoice(invoice_id).await?;
    Ok(Json(invoice))
}

/// List invoices, optionally only outstanding ones
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<InvoiceListQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "view")?;
    let service = InvoiceService::new(state.db);
    let invoices = service.list_invoices(query.outstanding_only).await?;
    Ok(Json(invoices))
}

/// Record a payment against an invoice
pub async fn record_invoice_payment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<InvoicePaymentInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "create")?;
    let service = InvoiceService::new(state.db);
    let invoice = service.record_payment(invoice_id, input).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Void an unpaid invoice
pub async fn void_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<VoidInvoiceInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "finance", "edit")?;
    let service = InvoiceService::new(state.db);
    let invoice = service.void_invoice(invoice_id, input).await?;
    Ok(Json(invoice))
}
