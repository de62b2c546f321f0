//! Resilient realtime chat client: a persistent WebSocket channel with
//! bounded reconnect backoff, a one-shot HTTP fallback for when the channel
//! is down, and an ordered in-session message log.

pub mod common;
pub mod config;
pub mod network;
pub mod session;
pub mod store;

pub use common::{ChatEvent, ChatMessage, ClientCommand, MessageMetadata, Sender};
pub use config::AppConfig;
pub use network::{
    ChatClient, ConnectionManager, FallbackClient, LinkState, Reconnect, ReconnectPolicy,
};
pub use session::{ChatSession, SendError};
pub use store::ChatStore;
