//! HTTP handlers for the production workflow
//!
//! Each endpoint advances one order through the status sequence; the
//! delivery endpoint additionally fires a WhatsApp notification when the
//! customer has a phone number on file.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::AppResult,
    external::WhatsAppClient,
    middleware::{check_permission, CurrentUser},
    services::production::{DeliverInput, ProductionService, StartPrintInput},
    services::{CustomerService, WhatsAppService},
    AppState,
};

/// Mark a draft order ready for production
pub async fn mark_ready(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "production", "edit")?;
    let service = ProductionService::new(state.db);
    let order = service.mark_ready(order_id, user.0.user_id).await?;
    Ok(Json(order))
}

/// Start printing, consuming the listed materials from stock
pub async fn start_print(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<StartPrintInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "production", "edit")?;
    let service = ProductionService::new(state.db);
    let order = service.start_print(order_id, user.0.user_id, input).await?;
    Ok(Json(order))
}

/// Finish the print stage
pub async fn finish_print(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "production", "edit")?;
    let service = ProductionService::new(state.db);
    let order = service.finish_print(order_id, user.0.user_id).await?;
    Ok(Json(order))
}

/// Start the press stage
pub async fn start_press(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "production", "edit")?;
    let service = ProductionService::new(state.db);
    let order = service.start_press(order_id, user.0.user_id).await?;
    Ok(Json(order))
}

/// Finish the press stage
pub async fn finish_press(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "production", "edit")?;
    let service = ProductionService::new(state.db);
    let order = service.finish_press(order_id, user.0.user_id).await?;
    Ok(Json(order))
}

/// Start the cutting stage
pub async fn start_cutting(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "production", "edit")?;
    let service = ProductionService::new(state.db);
    let order = service.start_cutting(order_id, user.0.user_id).await?;
    Ok(Json(order))
}

/// Finish the cutting stage
pub async fn finish_cutting(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "production", "edit")?;
    let service = ProductionService::new(state.db);
    let order = service.finish_cutting(order_id, user.0.user_id).await?;
    Ok(Json(order))
}

/// Mark a print-only order completed
pub async fn complete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "production", "edit")?;
    let service = ProductionService::new(state.db);
    let order = service.complete(order_id, user.0.user_id).await?;
    Ok(Json(order))
}

/// Hand a completed order over to the customer
pub async fn deliver(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<DeliverInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "production", "edit")?;
    let service = ProductionService::new(state.db.clone());
    let order = service.deliver(order_id, user.0.user_id, input).await?;

    // Delivery notification is best-effort: a messaging failure must not
    // roll back the handover
    let customers = CustomerService::new(state.db.clone());
    if let Ok(customer) = customers.get_customer(order.customer_id).await {
        if let Some(phone) = customer.phone {
            let client = WhatsAppClient::from_config(&state.config.whatsapp);
            let whatsapp = WhatsAppService::new(state.db, client);
            if let Err(e) = whatsapp.notify_delivery(&order, &phone).await {
                warn!(order_id = %order.id, error = %e, "Delivery notification failed");
            }
        }
    }

    Ok(Json(order))
}

/// Status history for one order
pub async fn get_history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "production", "view")?;
    let service = ProductionService::new(state.db);
    let history = service.get_history(order_id).await?;
    Ok(Json(history))
}

/// Orders currently in the production pipeline, grouped by stage
pub async fn production_queue(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "production", "view")?;
    let service = ProductionService::new(state.db);
    let queue = service.production_queue().await?;
    Ok(Json(queue))
}
