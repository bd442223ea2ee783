//! Route definitions for PrintFlow ERP

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (login/refresh are public)
        .nest("/auth", auth_routes())
        // WhatsApp webhook (public - called by the Cloud API)
        .route(
            "/webhook/whatsapp",
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        // Protected routes
        .nest("/customers", customer_routes())
        .nest("/orders", order_routes())
        .nest("/production", production_routes())
        .nest("/accounts", account_routes())
        .nest("/journal", journal_routes())
        .nest("/periods", period_routes())
        .nest("/reports", report_routes())
        .nest("/invoices", invoice_routes())
        .nest("/vendors", vendor_routes())
        .nest("/bills", bill_routes())
        .nest("/assets", asset_routes())
        .nest("/inventory", inventory_routes())
        .nest("/roles", role_routes())
        .nest("/users", user_routes())
        .nest("/whatsapp", whatsapp_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .nest(
            "/users",
            Router::new()
                .route("/", post(handlers::create_user))
                .route_layer(middleware::from_fn(auth_middleware)),
        )
}

/// Customer management routes (protected)
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:customer_id",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::deactivate_customer),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Order management routes (protected)
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:order_id",
            get(handlers::get_order).put(handlers::update_order),
        )
        .route("/:order_id/cancel", post(handlers::cancel_order))
        .route(
            "/:order_id/down-payment",
            post(handlers::record_down_payment),
        )
        .route("/:order_id/history", get(handlers::get_history))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Production workflow routes (protected)
fn production_routes() -> Router<AppState> {
    Router::new()
        .route("/queue", get(handlers::production_queue))
        .route("/:order_id/ready", post(handlers::mark_ready))
        .route("/:order_id/print/start", post(handlers::start_print))
        .route("/:order_id/print/finish", post(handlers::finish_print))
        .route("/:order_id/press/start", post(handlers::start_press))
        .route("/:order_id/press/finish", post(handlers::finish_press))
        .route("/:order_id/cutting/start", post(handlers::start_cutting))
        .route("/:order_id/cutting/finish", post(handlers::finish_cutting))
        .route("/:order_id/complete", post(handlers::complete))
        .route("/:order_id/deliver", post(handlers::deliver))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Chart of accounts routes (protected)
fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route(
            "/:account_id",
            get(handlers::get_account)
                .put(handlers::update_account)
                .delete(handlers::delete_account),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Journal entry routes (protected)
fn journal_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_entries).post(handlers::create_entry),
        )
        .route("/:entry_id", get(handlers::get_entry))
        .route("/:entry_id/post", post(handlers::post_entry))
        .route("/:entry_id/void", post(handlers::void_entry))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Financial period routes (protected)
fn period_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_periods))
        .route("/close", post(handlers::close_period))
        .route("/reopen", post(handlers::reopen_period))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Ledger report routes (protected)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/trial-balance", get(handlers::trial_balance))
        .route("/general-ledger/:account_id", get(handlers::general_ledger))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Invoice routes (protected)
fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_invoices).post(handlers::issue_invoice),
        )
        .route("/:invoice_id", get(handlers::get_invoice))
        .route(
            "/:invoice_id/payments",
            post(handlers::record_invoice_payment),
        )
        .route("/:invoice_id/void", post(handlers::void_invoice))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Vendor routes (protected)
fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_vendors).post(handlers::create_vendor),
        )
        .route(
            "/:vendor_id",
            put(handlers::update_vendor).delete(handlers::deactivate_vendor),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Bill routes (protected)
fn bill_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_bills).post(handlers::create_bill))
        .route("/:bill_id", get(handlers::get_bill))
        .route("/:bill_id/payments", post(handlers::pay_bill))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Fixed asset routes (protected)
fn asset_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_assets).post(handlers::create_asset))
        .route("/:asset_id", get(handlers::get_asset))
        .route("/:asset_id/retire", post(handlers::retire_asset))
        .route("/depreciation/run", post(handlers::run_depreciation))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/items/:item_id",
            get(handlers::get_item).put(handlers::update_item),
        )
        .route("/items/:item_id/movements", get(handlers::list_movements))
        .route("/items/:item_id/balance", get(handlers::get_balance))
        .route("/movements", post(handlers::record_movement))
        .route("/low-stock", get(handlers::low_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Role management routes (protected)
fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_roles).post(handlers::create_role))
        .route(
            "/:role_id",
            get(handlers::get_role)
                .put(handlers::update_role)
                .delete(handlers::delete_role),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// User administration routes (protected)
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users))
        .route("/:user_id/role", put(handlers::assign_role))
        .route("/:user_id", delete(handlers::deactivate_user))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// WhatsApp chat routes (protected)
fn whatsapp_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(handlers::send_message))
        .route("/history/:wa_contact", get(handlers::chat_history))
        .route_layer(middleware::from_fn(auth_middleware))
}
