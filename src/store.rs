use crate::common::ChatMessage;

/// Nhật ký tin nhắn của một phiên chat, cùng các cờ trạng thái tạm thời.
///
/// Append-only for the lifetime of the session (apart from an explicit
/// clear); display order is insertion order. Pure state container, no I/O.
#[derive(Debug, Default)]
pub struct ChatStore {
    messages: Vec<ChatMessage>,
    loading: bool,
    error: Option<String>,
    notice: Option<String>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Hard, user-visible error (fallback failure or exhausted retries).
    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Non-blocking connectivity notice ("reconnecting..."), distinct from
    /// the hard error.
    pub fn set_notice(&mut self, notice: Option<String>) {
        self.notice = notice;
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}
