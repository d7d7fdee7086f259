//! WebSocket layer: feed connection and lifecycle management

mod client;
mod manager;

pub use client::WsClient;
pub use manager::FeedManager;
