//! Publisher module for IPC communication
//!
//! Publishes depth views to the rendering surface over a Unix socket.

use bytes::{BufMut, BytesMut};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{LadderError, Result};
use crate::view::DepthView;

/// Publisher for sending depth views via Unix socket
pub struct Publisher {
    socket_path: String,
    stream: Mutex<Option<UnixStream>>,
}

impl Publisher {
    /// Create a new publisher
    pub async fn new(socket_path: &str) -> Result<Self> {
        let publisher = Self {
            socket_path: socket_path.to_string(),
            stream: Mutex::new(None),
        };

        // Try initial connection (may fail if the renderer isn't ready)
        if let Err(e) = publisher.connect().await {
            warn!(error = %e, "Initial IPC connection failed, will retry on publish");
        }

        Ok(publisher)
    }

    /// Connect to the Unix socket
    async fn connect(&self) -> Result<()> {
        let path = Path::new(&self.socket_path);

        if !path.exists() {
            return Err(LadderError::Ipc(format!(
                "Socket path does not exist: {}",
                self.socket_path
            )));
        }

        let stream = UnixStream::connect(path).await.map_err(|e| {
            LadderError::Ipc(format!("Failed to connect to {}: {}", self.socket_path, e))
        })?;

        let mut guard = self.stream.lock().await;
        *guard = Some(stream);

        info!(path = %self.socket_path, "Connected to IPC socket");
        Ok(())
    }

    /// Publish a depth view
    pub async fn publish(&self, view: &DepthView) -> Result<()> {
        // Serialize using MessagePack for efficiency
        let data = rmp_serde::to_vec(view)
            .map_err(|e| LadderError::Serialization(format!("Failed to serialize: {}", e)))?;

        // Frame with a big-endian length prefix
        let mut message = BytesMut::with_capacity(4 + data.len());
        message.put_u32(data.len() as u32);
        message.put_slice(&data);

        // Try to send
        let mut guard = self.stream.lock().await;

        // Check if we need to reconnect
        if guard.is_none() {
            drop(guard);
            if let Err(e) = self.connect().await {
                debug!(error = %e, "Failed to reconnect to IPC socket");
                return Ok(()); // Don't fail on publish errors
            }
            guard = self.stream.lock().await;
        }

        if let Some(stream) = guard.as_mut() {
            match stream.write_all(&message).await {
                Ok(_) => {
                    debug!(
                        symbol = %view.symbol,
                        rows = view.rows.len(),
                        "Published depth view"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "Failed to write to IPC socket");
                    *guard = None; // Mark as disconnected
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::OrderBookMessage;
    use crate::orderbook::{BookManager, PriceLevel};
    use crate::view::ViewConfig;
    use rust_decimal_macros::dec;
    use tokio::io::AsyncReadExt;
    use tokio::net::UnixListener;

    fn sample_view() -> DepthView {
        let mut books = BookManager::new();
        books.apply(
            "BTCUSDT",
            &OrderBookMessage::Snapshot {
                sequence: Some(1),
                asks: vec![PriceLevel::new(dec!(100), dec!(2))],
                bids: vec![PriceLevel::new(dec!(99), dec!(5))],
            },
        );
        books.view("BTCUSDT", ViewConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn publishes_length_prefixed_messagepack() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("ladder.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();

        let publisher = Publisher::new(socket_path.to_str().unwrap())
            .await
            .unwrap();
        let (mut server, _) = listener.accept().await.unwrap();

        let view = sample_view();
        publisher.publish(&view).await.unwrap();

        let mut len_buf = [0u8; 4];
        server.read_exact(&mut len_buf).await.unwrap();
        let len = u32::from_be_bytes(len_buf) as usize;

        let mut payload = vec![0u8; len];
        server.read_exact(&mut payload).await.unwrap();

        let decoded: DepthView = rmp_serde::from_slice(&payload).unwrap();
        assert_eq!(decoded, view);
    }

    #[tokio::test]
    async fn missing_socket_does_not_fail_publish() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("absent.sock");

        let publisher = Publisher::new(socket_path.to_str().unwrap())
            .await
            .unwrap();

        // Nothing is listening; the view is dropped rather than erroring.
        assert!(publisher.publish(&sample_view()).await.is_ok());
    }
}
