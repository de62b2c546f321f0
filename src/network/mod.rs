pub mod client;
pub mod fallback;
pub mod manager;

pub use client::ChatClient;
pub use fallback::FallbackClient;
pub use manager::{ConnectionManager, LinkState, Reconnect, ReconnectPolicy};
