use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::common::{ChatEvent, ChatMessage, ClientCommand};
use crate::config::AppConfig;
use crate::network::{ChatClient, FallbackClient, LinkState};
use crate::store::ChatStore;

/// Channel capacity between the session and the transport driver.
const CHANNEL_CAPACITY: usize = 100;

const RECONNECTING_NOTICE: &str = "Connection lost. Reconnecting to chat service...";
const UNAVAILABLE_ERROR: &str = "Chat service unavailable. Make sure the server is running.";

/// Why an outgoing message could not be delivered. Surfaced through the
/// session's error observable, never thrown across the public boundary.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("chat request failed: {0}")]
    Fallback(#[from] reqwest::Error),
    #[error("chat channel busy; message not delivered")]
    ChannelBusy,
}

/// Điều phối viên của một phiên chat: nhận tin nhắn từ người dùng, chọn
/// kênh gửi, và gom mọi sự kiện mạng vào nhật ký tin nhắn.
///
/// One session owns one store and one transport driver; nothing is shared
/// across sessions, so several widgets can run side by side. Dropping the
/// session closes the command channel, which stops the driver task.
pub struct ChatSession {
    store: ChatStore,
    command_sender: mpsc::Sender<ClientCommand>,
    event_receiver: mpsc::Receiver<ChatEvent>,
    link_state: watch::Receiver<LinkState>,
    fallback: FallbackClient,
    driver: Option<JoinHandle<()>>,
}

impl ChatSession {
    /// Wire a full session against a live backend: spawns the transport
    /// driver task and returns the handle the caller owns.
    pub fn spawn(config: &AppConfig) -> Self {
        // Kênh giao tiếp giữa phiên và tầng mạng.
        let (command_sender, command_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (event_sender, event_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (state_publisher, link_state) = watch::channel(LinkState::Idle);

        let client = ChatClient::new(event_sender, command_receiver, state_publisher, config);
        let driver = tokio::spawn(client.run());

        Self {
            store: ChatStore::new(),
            command_sender,
            event_receiver,
            link_state,
            fallback: FallbackClient::new(&config.api_url),
            driver: Some(driver),
        }
    }

    /// Assemble a session from externally wired transport halves. This is
    /// the injection point for tests and for callers embedding their own
    /// driver.
    pub fn with_transport(
        command_sender: mpsc::Sender<ClientCommand>,
        event_receiver: mpsc::Receiver<ChatEvent>,
        link_state: watch::Receiver<LinkState>,
        fallback: FallbackClient,
    ) -> Self {
        Self {
            store: ChatStore::new(),
            command_sender,
            event_receiver,
            link_state,
            fallback,
            driver: None,
        }
    }

    /// Send one user message. The user's entry is appended synchronously,
    /// before any network round-trip, so call order is display order. The
    /// reply path depends on the link state at call time: the realtime
    /// channel when open, the fallback request otherwise (including during
    /// reconnect backoff).
    pub async fn send_message(&mut self, content: &str) {
        self.store.set_error(None);
        self.store.set_loading(true);
        self.store.push_message(ChatMessage::user(content));

        match self.route(content).await {
            Ok(Some(reply)) => self.store.push_message(reply),
            Ok(None) => {}
            Err(err) => self.store.set_error(Some(err.to_string())),
        }
        // Every exit path lands here; the busy flag never sticks.
        self.store.set_loading(false);
    }

    async fn route(&mut self, content: &str) -> Result<Option<ChatMessage>, SendError> {
        if *self.link_state.borrow() == LinkState::Open {
            self.command_sender
                .try_send(ClientCommand::SendMessage(content.to_string()))
                .map_err(|_| SendError::ChannelBusy)?;
            // The reply arrives later as a transport event.
            Ok(None)
        } else {
            Ok(self.fallback.send(content).await?)
        }
    }

    /// Drain pending transport events into the store without blocking.
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.apply_event(event);
        }
    }

    /// Wait for the next transport event, apply it to the store, and hand
    /// it back. Returns `None` once the driver has stopped.
    pub async fn recv_event(&mut self) -> Option<ChatEvent> {
        let event = self.event_receiver.recv().await?;
        self.apply_event(event.clone());
        Some(event)
    }

    fn apply_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Connected => {
                self.store.set_notice(None);
                self.store.set_error(None);
            }
            ChatEvent::MessageReceived(message) => self.store.push_message(message),
            ChatEvent::Reconnecting => {
                self.store.set_notice(Some(RECONNECTING_NOTICE.to_string()));
            }
            ChatEvent::Unavailable => {
                self.store.set_notice(None);
                self.store.set_error(Some(UNAVAILABLE_ERROR.to_string()));
            }
        }
    }

    /// Empty the message log. Connection state is untouched.
    pub fn clear_messages(&mut self) {
        self.store.clear_messages();
    }

    /// Request driver teardown. Idempotent; safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Err(err) = self.command_sender.try_send(ClientCommand::Shutdown) {
            log::debug!("Shutdown request not delivered (driver already gone): {err}");
        }
    }

    /// Tear down and wait for the driver task to stop.
    pub async fn close(mut self) {
        self.shutdown();
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.store.messages()
    }

    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.store.error()
    }

    pub fn notice(&self) -> Option<&str> {
        self.store.notice()
    }

    pub fn link_state(&self) -> LinkState {
        *self.link_state.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{MessageMetadata, Sender};

    struct Harness {
        session: ChatSession,
        commands: mpsc::Receiver<ClientCommand>,
        events: mpsc::Sender<ChatEvent>,
        state: watch::Sender<LinkState>,
    }

    /// A session wired to hand-held transport ends and a fallback endpoint
    /// that refuses connections.
    fn harness(initial: LinkState) -> Harness {
        let (command_sender, commands) = mpsc::channel(CHANNEL_CAPACITY);
        let (events, event_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (state, link_state) = watch::channel(initial);
        let session = ChatSession::with_transport(
            command_sender,
            event_receiver,
            link_state,
            FallbackClient::new("http://127.0.0.1:9/api"),
        );
        Harness {
            session,
            commands,
            events,
            state,
        }
    }

    #[tokio::test]
    async fn open_link_routes_through_the_channel_not_the_fallback() {
        let mut harness = harness(LinkState::Open);

        harness.session.send_message("Book a hotel").await;

        // The user's entry lands synchronously and the command goes out.
        assert_eq!(harness.session.messages().len(), 1);
        assert_eq!(harness.session.messages()[0].sender, Sender::User);
        match harness.commands.try_recv() {
            Ok(ClientCommand::SendMessage(content)) => assert_eq!(content, "Book a hotel"),
            other => panic!("expected an outbound command, got {other:?}"),
        }
        // The dead fallback endpoint was never contacted.
        assert!(harness.session.error().is_none());
        assert!(!harness.session.is_loading());
    }

    #[tokio::test]
    async fn closed_link_uses_the_fallback_and_surfaces_its_failure() {
        let mut harness = harness(LinkState::Retrying);

        harness.session.send_message("hello?").await;

        // User entry appended even though delivery failed; no synthetic bot
        // reply; busy flag cleared.
        assert_eq!(harness.session.messages().len(), 1);
        assert_eq!(harness.session.messages()[0].content, "hello?");
        assert!(harness.session.error().is_some());
        assert!(!harness.session.is_loading());
        assert!(harness.commands.try_recv().is_err());
    }

    #[tokio::test]
    async fn user_entries_keep_call_order_across_failures() {
        let mut harness = harness(LinkState::Idle);

        harness.session.send_message("one").await;
        harness.session.send_message("two").await;
        harness.session.send_message("three").await;

        let contents: Vec<&str> = harness
            .session
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn send_clears_a_previous_error() {
        let mut harness = harness(LinkState::Open);
        harness
            .session
            .store
            .set_error(Some("stale failure".into()));

        harness.session.send_message("fresh start").await;

        assert!(harness.session.error().is_none());
    }

    #[tokio::test]
    async fn full_command_channel_surfaces_busy_error() {
        let (command_sender, _commands) = mpsc::channel(1);
        command_sender
            .try_send(ClientCommand::SendMessage("stuck".into()))
            .unwrap();
        let (_events, event_receiver) = mpsc::channel(1);
        let (_state, link_state) = watch::channel(LinkState::Open);
        let mut session = ChatSession::with_transport(
            command_sender,
            event_receiver,
            link_state,
            FallbackClient::new("http://127.0.0.1:9/api"),
        );

        session.send_message("overflow").await;

        assert_eq!(
            session.error(),
            Some("chat channel busy; message not delivered")
        );
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn events_apply_to_the_store_in_arrival_order() {
        let mut harness = harness(LinkState::Idle);

        harness.events.send(ChatEvent::Reconnecting).await.unwrap();
        harness.session.poll_events();
        assert!(harness.session.notice().is_some());
        assert!(harness.session.error().is_none());

        harness.events.send(ChatEvent::Connected).await.unwrap();
        harness
            .events
            .send(ChatEvent::MessageReceived(ChatMessage::bot(
                "Hello!",
                MessageMetadata::default(),
            )))
            .await
            .unwrap();
        harness.session.poll_events();

        assert!(harness.session.notice().is_none());
        assert_eq!(harness.session.messages().len(), 1);
        assert_eq!(harness.session.messages()[0].content, "Hello!");
    }

    #[tokio::test]
    async fn unavailable_sets_the_persistent_error() {
        let mut harness = harness(LinkState::Exhausted);

        harness.events.send(ChatEvent::Unavailable).await.unwrap();
        harness.session.poll_events();

        assert_eq!(harness.session.error(), Some(UNAVAILABLE_ERROR));
        assert!(harness.session.notice().is_none());
    }

    #[tokio::test]
    async fn clear_messages_leaves_the_link_alone() {
        let mut harness = harness(LinkState::Open);
        harness.session.send_message("hi").await;

        harness.session.clear_messages();

        assert!(harness.session.messages().is_empty());
        assert_eq!(harness.session.link_state(), LinkState::Open);
        // Appending still works after a clear.
        harness.state.send_replace(LinkState::Open);
        harness.session.send_message("again").await;
        assert_eq!(harness.session.messages().len(), 1);
    }
}
