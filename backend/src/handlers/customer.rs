//! HTTP handlers for customer management

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
    services::customer::CustomerService,
    AppState,
};
use shared::models::CustomerInput;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Debug, Deserialize)]
pub struct CustomerListQuery {
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

/// Register a new customer
pub async fn create_customer(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<CustomerInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "customer", "create")?;
    let service = CustomerService::new(state.db);
    let customer = service.create_customer(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Get a customer by ID
pub async fn get_customer(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "customer", "view")?;
    let service = CustomerService::new(state.db);
    let customer = service.get_customer(customer_id).await?;
    Ok(Json(customer))
}

/// List customers with optional name search
pub async fn list_customers(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<CustomerListQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "customer", "view")?;
    let service = CustomerService::new(state.db);
    let (customers, total) = service
        .list_customers(query.search.as_deref(), &query.pagination)
        .await?;
    Ok(Json(PaginatedResponse::new(
        customers,
        total,
        &query.pagination,
    )))
}

/// Update a customer
pub async fn update_customer(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<CustomerInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "customer", "edit")?;
    let service = CustomerService::new(state.db);
    let customer = service.update_customer(customer_id, input).await?;
    Ok(Json(customer))
}

/// Deactivate a customer
pub async fn deactivate_customer(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "customer", "delete")?;
    let service = CustomerService::new(state.db);
    service.deactivate_customer(customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
