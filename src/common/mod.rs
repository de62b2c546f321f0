pub mod commands;
pub mod events;
pub mod types;
pub mod wire;

pub use commands::ClientCommand;
pub use events::ChatEvent;
pub use types::{ChatMessage, MessageMetadata, Sender};
pub use wire::{InboundFrame, OutboundFrame};
