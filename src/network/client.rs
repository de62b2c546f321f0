use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::common::{ChatEvent, ClientCommand, InboundFrame, OutboundFrame};
use crate::config::AppConfig;
use crate::network::manager::{ConnectionManager, LinkState, Reconnect};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The pending reconnect: absolute deadline plus the epoch that scheduled it.
type ReconnectTimer = Option<(Instant, u64)>;

/// Runtime half of the connection lifecycle. Owns the WebSocket, executes
/// the [`ConnectionManager`]'s decisions, and bridges the socket to the
/// session over channels: commands in, normalized events out, link state
/// published through a watch.
///
/// Everything runs on one task; handlers run to completion between select
/// wakeups, so no locking is needed anywhere in the chat path.
pub struct ChatClient {
    event_sender: mpsc::Sender<ChatEvent>,
    command_receiver: mpsc::Receiver<ClientCommand>,
    state_publisher: watch::Sender<LinkState>,
    manager: ConnectionManager,
    ws_url: String,
}

impl ChatClient {
    pub fn new(
        event_sender: mpsc::Sender<ChatEvent>,
        command_receiver: mpsc::Receiver<ClientCommand>,
        state_publisher: watch::Sender<LinkState>,
        config: &AppConfig,
    ) -> Self {
        Self {
            event_sender,
            command_receiver,
            state_publisher,
            manager: ConnectionManager::new(config.reconnect.clone()),
            ws_url: config.ws_url.clone(),
        }
    }

    pub async fn run(mut self) {
        let mut ws: Option<WsStream> = None;
        let mut timer: ReconnectTimer = None;

        log::info!("Chat transport loop started; backend {}", self.ws_url);
        if self.manager.connect() {
            self.dial(&mut ws, &mut timer).await;
        }

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(ClientCommand::SendMessage(content)) => {
                            self.handle_send(&mut ws, &mut timer, content).await;
                        }
                        Some(ClientCommand::Shutdown) | None => break,
                    }
                }
                frame = next_frame(&mut ws) => {
                    self.handle_frame(frame, &mut ws, &mut timer).await;
                }
                epoch = reconnect_due(timer) => {
                    timer = None;
                    if self.manager.timer_fired(epoch) {
                        self.dial(&mut ws, &mut timer).await;
                    }
                }
            }
        }

        self.manager.teardown();
        self.publish_state();
        if let Some(mut stream) = ws {
            let _ = stream.close(None).await;
        }
        log::info!("Chat transport loop stopped");
    }

    async fn dial(&mut self, ws: &mut Option<WsStream>, timer: &mut ReconnectTimer) {
        self.publish_state();
        match connect_async(self.ws_url.as_str()).await {
            Ok((stream, _)) => {
                *ws = Some(stream);
                self.manager.link_opened();
                self.publish_state();
                log::info!("Chat channel open");
                self.emit(ChatEvent::Connected).await;
            }
            Err(err) => {
                log::warn!("Chat channel connect failed: {err}");
                self.handle_close(timer).await;
            }
        }
    }

    async fn handle_close(&mut self, timer: &mut ReconnectTimer) {
        match self.manager.link_closed() {
            Reconnect::After {
                attempt,
                delay,
                epoch,
                notify,
            } => {
                log::info!("Chat channel down; reconnect attempt {attempt} in {delay:?}");
                *timer = Some((Instant::now() + delay, epoch));
                if notify {
                    self.emit(ChatEvent::Reconnecting).await;
                }
            }
            Reconnect::GiveUp => {
                log::warn!("Chat channel retry budget spent; giving up for this session");
                self.emit(ChatEvent::Unavailable).await;
            }
            Reconnect::Ignored => {}
        }
        self.publish_state();
    }

    async fn handle_frame(
        &mut self,
        frame: Option<Result<Message, WsError>>,
        ws: &mut Option<WsStream>,
        timer: &mut ReconnectTimer,
    ) {
        match frame {
            Some(Ok(Message::Text(text))) => self.handle_inbound(&text).await,
            Some(Ok(Message::Close(_))) | None => {
                log::info!("Chat channel closed by peer");
                *ws = None;
                self.handle_close(timer).await;
            }
            Some(Err(err)) => {
                log::warn!("Chat channel error: {err}");
                *ws = None;
                self.handle_close(timer).await;
            }
            // Ping/pong/binary carry nothing to normalize.
            Some(Ok(_)) => {}
        }
    }

    async fn handle_inbound(&mut self, text: &str) {
        match serde_json::from_str::<InboundFrame>(text) {
            Ok(frame) => {
                self.emit(ChatEvent::MessageReceived(frame.into_message()))
                    .await;
            }
            Err(err) => {
                // Malformed frames are dropped without surfacing to the user.
                log::warn!("Dropping malformed inbound frame: {err}");
            }
        }
    }

    async fn handle_send(
        &mut self,
        ws: &mut Option<WsStream>,
        timer: &mut ReconnectTimer,
        content: String,
    ) {
        if !self.manager.is_open() {
            log::warn!(
                "Dropping outbound message; channel is {}",
                self.manager.state()
            );
            return;
        }

        let json = match serde_json::to_string(&OutboundFrame::message(content)) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Failed to serialize outbound frame: {err}");
                return;
            }
        };

        let result = match ws.as_mut() {
            Some(stream) => stream.send(Message::Text(json)).await,
            // Open state always carries a stream; nothing to do otherwise.
            None => return,
        };
        if let Err(err) = result {
            log::warn!("Chat channel send failed: {err}");
            *ws = None;
            self.handle_close(timer).await;
        }
    }

    async fn emit(&self, event: ChatEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("Failed to notify session: {err}");
        }
    }

    fn publish_state(&self) {
        self.state_publisher.send_replace(self.manager.state());
    }
}

/// Next frame from the socket, or pend forever while no stream is live.
/// Keeps the select loop shape stable whether or not the channel is open.
async fn next_frame(ws: &mut Option<WsStream>) -> Option<Result<Message, WsError>> {
    match ws {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

/// Resolve with the scheduled epoch once the backoff deadline passes, or
/// pend forever while no timer is armed. The deadline is absolute, so being
/// re-polled across select iterations does not stretch the delay.
async fn reconnect_due(timer: ReconnectTimer) -> u64 {
    match timer {
        Some((deadline, epoch)) => {
            sleep_until(deadline).await;
            epoch
        }
        None => std::future::pending().await,
    }
}
