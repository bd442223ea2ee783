//! HTTP handlers for authentication and user accounts

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::{check_permission, CurrentUser},
    services::auth::{AuthService, CreateUserInput},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.login(&request.email, &request.password).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.refresh_token(&request.refresh_token).await?;
    Ok(Json(tokens))
}

/// Create a user account (admin only)
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<CreateUserInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "user", "create")?;
    let service = AuthService::new(state.db, &state.config);
    let created = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
