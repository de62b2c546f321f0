use crate::common::types::ChatMessage;

/// Sự kiện từ tầng mạng gửi lên phiên chat.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// The persistent channel is open.
    Connected,
    /// A backend frame was normalized into a message.
    MessageReceived(ChatMessage),
    /// The channel dropped and a reconnect is pending. Emitted once per
    /// outage, not once per attempt.
    Reconnecting,
    /// The retry budget is spent; no further reconnects this session.
    Unavailable,
}
