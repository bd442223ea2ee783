//! WhatsApp messaging service
//!
//! Receives Cloud API webhooks, logs every message in and out, and answers
//! the `status <SPK>` quick command so customers can check their order from
//! chat. Outbound sends go through [`WhatsAppClient`] when one is
//! configured; without a token the service still logs and replies nothing.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::whatsapp::WhatsAppClient;
use crate::services::order::OrderService;
use shared::models::{ChatDirection, ChatMessage, Order};

/// WhatsApp service
#[derive(Clone)]
pub struct WhatsAppService {
    db: PgPool,
    client: Option<WhatsAppClient>,
    orders: OrderService,
}

/// Cloud API webhook request body
///
/// See: https://developers.facebook.com/docs/whatsapp/cloud-api/webhooks/payload-examples
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    pub field: String,
    pub value: WebhookValue,
}

#[derive(Debug, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    /// Sender number in international form without '+', e.g. "62812..."
    pub from: String,
    /// Provider message id ("wamid...")
    pub id: String,
    /// Unix seconds as a string
    pub timestamp: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: Option<WebhookText>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookText {
    pub body: String,
}

/// Summary of one webhook delivery
#[derive(Debug, serde::Serialize)]
pub struct WebhookOutcome {
    pub received: usize,
    pub duplicates: usize,
    pub replies_sent: usize,
}

#[derive(Debug, sqlx::FromRow)]
struct ChatMessageRow {
    id: Uuid,
    direction: String,
    wa_contact: String,
    body: String,
    provider_message_id: Option<String>,
    occurred_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ChatMessageRow> for ChatMessage {
    type Error = AppError;

    fn try_from(row: ChatMessageRow) -> Result<Self, Self::Error> {
        let direction = ChatDirection::from_str(&row.direction).ok_or_else(|| {
            AppError::Internal(format!("Unknown chat direction: {}", row.direction))
        })?;
        Ok(ChatMessage {
            id: row.id,
            direction,
            wa_contact: row.wa_contact,
            body: row.body,
            provider_message_id: row.provider_message_id,
            occurred_at: row.occurred_at,
            created_at: row.created_at,
        })
    }
}

impl WhatsAppService {
    /// Create a new WhatsAppService instance
    pub fn new(db: PgPool, client: Option<WhatsAppClient>) -> Self {
        let orders = OrderService::new(db.clone());
        Self {
            db,
            client,
            orders,
        }
    }

    /// Process one webhook delivery: log messages, answer quick commands
    ///
    /// Redelivered messages are detected by provider message id and
    /// skipped, so webhook retries never double-log or double-reply.
    pub async fn process_webhook(&self, request: WebhookRequest) -> AppResult<WebhookOutcome> {
        if request.object != "whatsapp_business_account" {
            warn!(object = %request.object, "Ignoring webhook for unknown object");
            return Ok(WebhookOutcome {
                received: 0,
                duplicates: 0,
                replies_sent: 0,
            });
        }

        let mut outcome = WebhookOutcome {
            received: 0,
            duplicates: 0,
            replies_sent: 0,
        };

        for entry in request.entry {
            for change in entry.changes {
                if change.field != "messages" {
                    continue;
                }
                for message in change.value.messages {
                    outcome.received += 1;
                    if self.is_duplicate(&message.id).await? {
                        debug!(provider_message_id = %message.id, "Duplicate webhook message");
                        outcome.duplicates += 1;
                        continue;
                    }

                    let Some(text) = &message.text else {
                        // Non-text messages are logged with a placeholder body
                        self.log_message(
                            ChatDirection::Inbound,
                            &message.from,
                            &format!("[{}]", message.message_type),
                            Some(&message.id),
                            parse_timestamp(&message.timestamp),
                        )
                        .await?;
                        continue;
                    };

                    self.log_message(
                        ChatDirection::Inbound,
                        &message.from,
                        &text.body,
                        Some(&message.id),
                        parse_timestamp(&message.timestamp),
                    )
                    .await?;

                    if let Some(reply) = self.handle_command(&text.body).await? {
                        self.send_message(&message.from, &reply).await?;
                        outcome.replies_sent += 1;
                    }
                }
            }
        }

        info!(
            received = outcome.received,
            duplicates = outcome.duplicates,
            replies = outcome.replies_sent,
            "Webhook processed"
        );
        Ok(outcome)
    }

    /// Send a text message and log it as outbound
    ///
    /// Without a configured client the message is logged but not delivered.
    pub async fn send_message(&self, to: &str, body: &str) -> AppResult<ChatMessage> {
        let provider_id = match &self.client {
            Some(client) => Some(client.send_text(to, body).await?),
            None => {
                warn!(to = %to, "WhatsApp client not configured, message logged only");
                None
            }
        };

        self.log_message(
            ChatDirection::Outbound,
            to,
            body,
            provider_id.as_deref(),
            Utc::now(),
        )
        .await
    }

    /// Notify a customer that their order has been handed over
    pub async fn notify_delivery(&self, order: &Order, phone: &str) -> AppResult<ChatMessage> {
        let body = format!(
            "Pesanan {} sudah dikirim. Terima kasih!",
            order.spk_number
        );
        self.send_message(&normalize_wa_number(phone), &body).await
    }

    /// Chat history for one contact, newest first
    pub async fn chat_history(&self, wa_contact: &str, limit: i64) -> AppResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, direction, wa_contact, body, provider_message_id, occurred_at, created_at
            FROM chat_messages
            WHERE wa_contact = $1
            ORDER BY occurred_at DESC
            LIMIT $2
            "#,
        )
        .bind(wa_contact)
        .bind(limit.clamp(1, 200))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Answer quick commands; currently `status <SPK>`
    async fn handle_command(&self, body: &str) -> AppResult<Option<String>> {
        let mut words = body.split_whitespace();
        let command = words.next().map(|w| w.to_lowercase());
        if command.as_deref() != Some("status") {
            return Ok(None);
        }
        let Some(spk) = words.next() else {
            return Ok(Some(
                "Format: status <nomor SPK>, contoh: status SPK-2026-0001".to_string(),
            ));
        };

        match self.orders.find_by_spk(&spk.to_uppercase()).await {
            Ok(order) => Ok(Some(status_reply(&order))),
            Err(AppError::NotFound(_)) => Ok(Some(format!(
                "Pesanan {} tidak ditemukan",
                spk.to_uppercase()
            ))),
            Err(e) => Err(e),
        }
    }

    async fn is_duplicate(&self, provider_message_id: &str) -> AppResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM chat_messages WHERE provider_message_id = $1",
        )
        .bind(provider_message_id)
        .fetch_one(&self.db)
        .await?;
        Ok(count > 0)
    }

    async fn log_message(
        &self,
        direction: ChatDirection,
        wa_contact: &str,
        body: &str,
        provider_message_id: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> AppResult<ChatMessage> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            INSERT INTO chat_messages (direction, wa_contact, body, provider_message_id, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, direction, wa_contact, body, provider_message_id, occurred_at, created_at
            "#,
        )
        .bind(direction.as_str())
        .bind(wa_contact)
        .bind(body)
        .bind(provider_message_id)
        .bind(occurred_at)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }
}

/// Human-readable status line for the quick command reply
fn status_reply(order: &Order) -> String {
    if order.is_cancelled {
        return format!("Pesanan {} sudah dibatalkan", order.spk_number);
    }
    let status_id = match order.status {
        shared::models::ProductionStatus::Draft => "menunggu konfirmasi",
        shared::models::ProductionStatus::ReadyForProd => "siap diproduksi",
        shared::models::ProductionStatus::Print => "sedang dicetak",
        shared::models::ProductionStatus::PrintDone => "selesai cetak",
        shared::models::ProductionStatus::Press => "sedang di-press",
        shared::models::ProductionStatus::Cutting => "sedang dipotong",
        shared::models::ProductionStatus::Completed => "selesai produksi",
        shared::models::ProductionStatus::Delivered => "sudah dikirim",
    };
    format!("Pesanan {}: {}", order.spk_number, status_id)
}

/// Strip the '+' the Cloud API does not use in recipient numbers
fn normalize_wa_number(phone: &str) -> String {
    phone.trim_start_matches('+').to_string()
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_payload_parses() {
        let payload = serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "123",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [{
                            "from": "628123456789",
                            "id": "wamid.abc",
                            "timestamp": "1756400000",
                            "type": "text",
                            "text": { "body": "status SPK-2026-0001" }
                        }]
                    }
                }]
            }]
        });
        let request: WebhookRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(request.entry.len(), 1);
        let message = &request.entry[0].changes[0].value.messages[0];
        assert_eq!(message.from, "628123456789");
        assert_eq!(message.text.as_ref().unwrap().body, "status SPK-2026-0001");
    }

    #[test]
    fn wa_number_normalization() {
        assert_eq!(normalize_wa_number("+628123456789"), "628123456789");
        assert_eq!(normalize_wa_number("628123456789"), "628123456789");
    }

    #[test]
    fn timestamp_parse_falls_back_on_garbage() {
        let parsed = parse_timestamp("1756400000");
        assert_eq!(parsed.timestamp(), 1_756_400_000);
        // Garbage input yields "now" rather than an error
        let fallback = parse_timestamp("not-a-number");
        assert!(fallback <= Utc::now());
    }
}
