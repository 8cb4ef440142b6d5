//! Chat channels - adapters over channel backends and the manager that polls them

mod adapter;
mod manager;
mod message;

pub use adapter::{ChannelAdapter, ChannelCapabilities, GenericChannelAdapter};
pub use manager::{ChannelManager, MessageHandler};
pub use message::{IncomingMessage, RawMessage, parse_date};
