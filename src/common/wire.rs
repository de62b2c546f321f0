use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::common::types::{ChatMessage, MessageMetadata};

/// Frame gửi tới backend qua kênh realtime.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub content: String,
    pub timestamp: String,
}

impl OutboundFrame {
    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: "message",
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Frame nhận từ backend. Unknown fields are ignored; anything that is not
/// a JSON object fails to parse and gets dropped by the driver.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl InboundFrame {
    /// Normalize into the canonical message entity. A frame without content
    /// becomes an empty-bodied bot message, never a null.
    pub fn into_message(self) -> ChatMessage {
        ChatMessage::bot(
            self.content.unwrap_or_default(),
            MessageMetadata {
                intent: self.intent,
                data: self.data,
            },
        )
    }
}
