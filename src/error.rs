//! Error types for the depth ladder service

use thiserror::Error;

/// Service-level errors.
///
/// Data-quality problems in the feed (a malformed level, a stale sequence)
/// never surface here; the engine degrades gracefully instead. These
/// variants cover structural failures of the surrounding plumbing, like a
/// dead transport or a payload that is not a message at all.
#[derive(Error, Debug)]
pub enum LadderError {
    #[error("WebSocket connection error: {0}")]
    WsConnection(String),

    #[error("WebSocket message error: {0}")]
    WsMessage(String),

    #[error("Failed to parse feed payload: {0}")]
    Parse(String),

    #[error("IPC error: {0}")]
    Ipc(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection timeout")]
    ConnectionTimeout,
}

impl From<tokio_tungstenite::tungstenite::Error> for LadderError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        LadderError::WsConnection(err.to_string())
    }
}

impl From<serde_json::Error> for LadderError {
    fn from(err: serde_json::Error) -> Self {
        LadderError::Parse(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for LadderError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        LadderError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for LadderError {
    fn from(err: std::io::Error) -> Self {
        LadderError::Ipc(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LadderError>;
