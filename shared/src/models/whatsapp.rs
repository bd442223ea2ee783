//! WhatsApp messaging models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message direction relative to the shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatDirection {
    Inbound,
    Outbound,
}

impl ChatDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatDirection::Inbound => "inbound",
            ChatDirection::Outbound => "outbound",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "inbound" => Some(ChatDirection::Inbound),
            "outbound" => Some(ChatDirection::Outbound),
            _ => None,
        }
    }
}

/// One logged chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub direction: ChatDirection,
    /// Counterparty WhatsApp number
    pub wa_contact: String,
    pub body: String,
    /// Provider-side message id, used for webhook deduplication
    pub provider_message_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
