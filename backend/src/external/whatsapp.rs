//! WhatsApp Cloud API client for outbound messages
//!
//! Sends text messages through the Graph API:
//! POST {api_base}/{phone_number_id}/messages

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::WhatsAppApiConfig;
use crate::error::{AppError, AppResult};

/// WhatsApp Cloud API client
#[derive(Clone)]
pub struct WhatsAppClient {
    client: Client,
    api_base: String,
    phone_number_id: String,
    access_token: String,
}

#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

impl WhatsAppClient {
    /// Build a client from config; None when no access token is configured
    pub fn from_config(config: &WhatsAppApiConfig) -> Option<Self> {
        if config.access_token.is_empty() || config.phone_number_id.is_empty() {
            return None;
        }
        Some(Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            phone_number_id: config.phone_number_id.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// Send a text message, returning the provider message id
    pub async fn send_text(&self, to: &str, body: &str) -> AppResult<String> {
        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);
        let request = SendTextRequest {
            messaging_product: "whatsapp",
            to,
            message_type: "text",
            text: TextBody { body },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::WhatsAppApiError(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::WhatsAppApiError(format!(
                "Cloud API returned {}: {}",
                status, detail
            )));
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| AppError::WhatsAppApiError(format!("Malformed response: {}", e)))?;

        let message_id = parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| {
                AppError::WhatsAppApiError("Response carried no message id".to_string())
            })?;

        debug!(to = %to, message_id = %message_id, "WhatsApp message sent");
        Ok(message_id)
    }
}
