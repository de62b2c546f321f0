use serde::{Deserialize, Serialize};

use crate::common::{ChatMessage, MessageMetadata};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    data: Option<ReplyPayload>,
}

#[derive(Debug, Deserialize)]
struct ReplyPayload {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl ReplyPayload {
    fn into_message(self) -> ChatMessage {
        ChatMessage::bot(
            self.reply.unwrap_or_default(),
            MessageMetadata {
                intent: self.intent,
                data: self.data,
            },
        )
    }
}

/// Kênh dự phòng: một request/response duy nhất, dùng khi kênh realtime
/// chưa mở. Stateless; failures are reported to the session, never retried
/// here.
#[derive(Debug, Clone)]
pub struct FallbackClient {
    http: reqwest::Client,
    endpoint: String,
}

impl FallbackClient {
    pub fn new(api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/chat", api_url.trim_end_matches('/')),
        }
    }

    /// Deliver one message and wait for the reply. `Ok(None)` means the
    /// backend produced no reply, which is not a failure.
    pub async fn send(&self, content: &str) -> Result<Option<ChatMessage>, reqwest::Error> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ChatRequest { message: content })
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        Ok(response.data.map(ReplyPayload::into_message))
    }
}
