//! HTTP handlers for the WhatsApp webhook and chat log
//!
//! The webhook endpoints are public: Meta calls GET for the subscription
//! handshake and POST for message deliveries. Everything else sits behind
//! the auth middleware.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::warn;

use crate::{
    error::{AppError, AppResult},
    external::WhatsAppClient,
    middleware::{check_permission, CurrentUser},
    services::whatsapp::{WebhookRequest, WhatsAppService},
    AppState,
};

/// Subscription handshake query sent by Meta
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub to: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    50
}

/// Answer the webhook subscription handshake
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> impl IntoResponse {
    let expected = &state.config.whatsapp.verify_token;
    match (query.mode.as_deref(), query.verify_token, query.challenge) {
        (Some("subscribe"), Some(token), Some(challenge))
            if !expected.is_empty() && token == *expected =>
        {
            (StatusCode::OK, challenge)
        }
        _ => {
            warn!("Webhook verification failed");
            (StatusCode::FORBIDDEN, String::new())
        }
    }
}

/// Receive a webhook delivery with inbound messages
///
/// The payload signature is checked against the app secret before the body
/// is parsed. An empty app secret skips the check (local development).
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let app_secret = &state.config.whatsapp.app_secret;
    if !app_secret.is_empty() {
        if let Err(reason) = verify_signature(app_secret, &headers, &body) {
            warn!("Webhook signature check failed: {}", reason);
            return Err(AppError::InvalidToken);
        }
    }

    let request: WebhookRequest = serde_json::from_slice(&body).map_err(|e| {
        AppError::Validation {
            field: "body".to_string(),
            message: format!("Invalid webhook payload: {}", e),
            message_id: format!("Payload webhook tidak valid: {}", e),
        }
    })?;

    let client = WhatsAppClient::from_config(&state.config.whatsapp);
    let service = WhatsAppService::new(state.db, client);
    let outcome = service.process_webhook(request).await?;
    Ok(Json(outcome))
}

/// Check the X-Hub-Signature-256 header: "sha256=" + HMAC-SHA256 hex digest
/// of the raw body keyed with the app secret
fn verify_signature(
    app_secret: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), &'static str> {
    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .ok_or("missing x-hub-signature-256 header")?;
    let received = signature
        .strip_prefix("sha256=")
        .ok_or("malformed signature header")?;

    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(app_secret.as_bytes()).map_err(|_| "bad hmac key")?;
    mac.update(body);
    let expected: String = mac
        .finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();

    if received != expected {
        return Err("signature mismatch");
    }
    Ok(())
}

/// Send a text message to a customer
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<SendMessageRequest>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "whatsapp", "create")?;
    let client = WhatsAppClient::from_config(&state.config.whatsapp);
    let service = WhatsAppService::new(state.db, client);
    let message = service.send_message(&request.to, &request.body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Chat history for one contact
pub async fn chat_history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(wa_contact): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user.0, "whatsapp", "view")?;
    let client = WhatsAppClient::from_config(&state.config.whatsapp);
    let service = WhatsAppService::new(state.db, client);
    let messages = service.chat_history(&wa_contact, query.limit).await?;
    Ok(Json(messages))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_headers(secret: &str, body: &[u8]) -> HeaderMap {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let digest: String = mac
            .finalize()
            .into_bytes()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-hub-signature-256",
            format!("sha256={}", digest).parse().unwrap(),
        );
        headers
    }

    #[test]
    fn valid_signature_passes() {
        let body = br#"{"object":"whatsapp_business_account","entry":[]}"#;
        let headers = signed_headers("app-secret", body);
        assert!(verify_signature("app-secret", &headers, body).is_ok());
    }

    #[test]
    fn tampered_body_fails() {
        let headers = signed_headers("app-secret", b"original");
        assert!(verify_signature("app-secret", &headers, b"tampered").is_err());
    }

    #[test]
    fn missing_header_fails() {
        let headers = HeaderMap::new();
        assert!(verify_signature("app-secret", &headers, b"{}").is_err());
    }
}
