//! WebSocket client for the order-book feed
//!
//! Handles connection, subscription, and message reception.

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::Message,
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::error::{LadderError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket client for a single feed connection
pub struct WsClient {
    stream: Option<WsStream>,
    endpoint: String,
    symbols: Vec<String>,
}

impl WsClient {
    /// Create a new WebSocket client
    pub fn new(endpoint: &str, symbols: Vec<String>) -> Self {
        Self {
            stream: None,
            endpoint: endpoint.to_string(),
            symbols,
        }
    }

    /// Connect to the feed endpoint and subscribe to all configured symbols
    pub async fn connect(&mut self) -> Result<()> {
        info!(url = %self.endpoint, "Connecting to order book feed");

        let (ws_stream, response) = connect_async(&self.endpoint).await.map_err(|e| {
            LadderError::WsConnection(format!("Failed to connect: {}", e))
        })?;

        info!(status = ?response.status(), "WebSocket connected");
        self.stream = Some(ws_stream);

        self.subscribe().await?;

        Ok(())
    }

    /// Send one subscribe frame per symbol. The feed replies with a full
    /// snapshot for each subscription before streaming deltas.
    async fn subscribe(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| LadderError::WsConnection("Not connected".to_string()))?;

        for symbol in &self.symbols {
            let frame = json!({
                "type": "subscribe",
                "channel": "order_book",
                "symbol": symbol,
            });

            stream
                .send(Message::Text(frame.to_string()))
                .await
                .map_err(|e| LadderError::WsMessage(e.to_string()))?;

            debug!(symbol = %symbol, "Subscribed to order book channel");
        }

        Ok(())
    }

    /// Receive the next text payload
    pub async fn recv(&mut self) -> Result<Option<String>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| LadderError::WsConnection("Not connected".to_string()))?;

        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                debug!(len = text.len(), "Received text message");
                Ok(Some(text))
            }
            Some(Ok(Message::Binary(data))) => {
                // Convert binary to text if needed
                let text = String::from_utf8_lossy(&data).to_string();
                Ok(Some(text))
            }
            Some(Ok(Message::Ping(data))) => {
                debug!("Received ping, sending pong");
                if let Some(stream) = self.stream.as_mut() {
                    let _ = stream.send(Message::Pong(data)).await;
                }
                Ok(None)
            }
            Some(Ok(Message::Pong(_))) => {
                debug!("Received pong");
                Ok(None)
            }
            Some(Ok(Message::Close(frame))) => {
                warn!(frame = ?frame, "Received close frame");
                self.stream = None;
                Err(LadderError::WsConnection("Connection closed".to_string()))
            }
            Some(Ok(Message::Frame(_))) => Ok(None),
            Some(Err(e)) => {
                error!(error = %e, "WebSocket error");
                self.stream = None;
                Err(LadderError::WsMessage(e.to_string()))
            }
            None => {
                warn!("WebSocket stream ended");
                self.stream = None;
                Err(LadderError::WsConnection("Stream ended".to_string()))
            }
        }
    }

    /// Send a ping to keep the connection alive
    pub async fn ping(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.as_mut() {
            stream
                .send(Message::Ping(vec![]))
                .await
                .map_err(|e| LadderError::WsMessage(e.to_string()))?;
        }
        Ok(())
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Close the connection
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
        }
    }
}
