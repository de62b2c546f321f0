use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bên đã tạo ra tin nhắn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Payload có cấu trúc đi kèm tin nhắn từ backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Domain model đại diện một tin nhắn chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub content: String,
    /// RFC 3339, assigned locally at creation time. Display order is append
    /// order, never timestamp order.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    /// A locally authored user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content.into(), None)
    }

    /// A bot message, normalized the same way for both transports.
    pub fn bot(content: impl Into<String>, metadata: MessageMetadata) -> Self {
        Self::new(Sender::Bot, content.into(), Some(metadata))
    }

    fn new(sender: Sender, content: String, metadata: Option<MessageMetadata>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            content,
            timestamp: Utc::now().to_rfc3339(),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_carry_no_metadata() {
        let message = ChatMessage::user("hello");
        assert_eq!(message.sender, Sender::User);
        assert_eq!(message.content, "hello");
        assert!(message.metadata.is_none());
    }

    #[test]
    fn ids_are_unique_within_a_session() {
        let a = ChatMessage::user("a");
        let b = ChatMessage::user("b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let message = ChatMessage::bot("hi", MessageMetadata::default());
        assert!(chrono::DateTime::parse_from_rfc3339(&message.timestamp).is_ok());
    }

    #[test]
    fn sender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sender::Bot).unwrap(), "\"bot\"");
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), "\"user\"");
    }
}
