//! Feed connection manager
//!
//! Handles reconnection logic and message dispatch.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{interval, sleep, timeout};
use tracing::{error, info, trace, warn};

use super::WsClient;
use crate::error::Result;
use crate::feed::parse_event;
use crate::AppState;

/// Maximum backoff delay in milliseconds (60 seconds)
const MAX_BACKOFF_MS: u64 = 60_000;
/// Cooldown period after which reconnect attempts are reset (5 minutes)
const RECONNECT_COOLDOWN_SECS: u64 = 300;

/// Manages the feed connection with automatic reconnection
pub struct FeedManager {
    state: Arc<AppState>,
    client: WsClient,
    reconnect_attempts: u32,
    last_successful_connection: Option<Instant>,
}

impl FeedManager {
    /// Create a new feed manager
    pub fn new(state: Arc<AppState>) -> Self {
        let client = WsClient::new(&state.config.ws_endpoint, state.config.symbols.clone());

        Self {
            state,
            client,
            reconnect_attempts: 0,
            last_successful_connection: None,
        }
    }

    /// Run the feed manager - runs indefinitely with automatic reconnection
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting feed manager with infinite retry");

        self.spawn_status_task();

        loop {
            // Reset reconnect attempts if we've been stable for a while
            if let Some(last_success) = self.last_successful_connection {
                if last_success.elapsed() > Duration::from_secs(RECONNECT_COOLDOWN_SECS) {
                    if self.reconnect_attempts > 0 {
                        info!(
                            previous_attempts = self.reconnect_attempts,
                            "Resetting reconnect counter after cooldown period"
                        );
                        self.reconnect_attempts = 0;
                    }
                }
            }

            match self.connect_and_process().await {
                Ok(()) => {
                    info!("Feed processing completed normally, reconnecting...");
                    // Brief pause before reconnecting after normal completion
                    sleep(Duration::from_secs(1)).await;
                }
                Err(e) => {
                    error!(error = %e, "Feed connection error");
                    self.reconnect_attempts += 1;

                    // Calculate delay with exponential backoff, capped at MAX_BACKOFF_MS
                    let base_delay = self.state.config.reconnect_delay_ms
                        * 2u64.pow(self.reconnect_attempts.min(6));
                    let delay = Duration::from_millis(base_delay.min(MAX_BACKOFF_MS));

                    warn!(
                        attempt = self.reconnect_attempts,
                        delay_secs = delay.as_secs(),
                        "Reconnecting after error..."
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Spawn the periodic status logging task. Spawned once so reconnects
    /// do not stack additional copies.
    fn spawn_status_task(&self) {
        let status_state = self.state.clone();
        let status_interval_secs = self.state.config.status_interval_secs;

        tokio::spawn(async move {
            let mut status_interval = interval(Duration::from_secs(status_interval_secs));
            loop {
                status_interval.tick().await;
                let books = status_state.books.read().await;
                for symbol in books.symbols() {
                    if let Some(book) = books.book(&symbol) {
                        if let Some(mid) = book.mid_price() {
                            let pressure = book.pressure(status_state.config.pressure_depth);
                            info!(
                                symbol = %symbol,
                                mid_price = %mid,
                                spread_bps = ?book.spread_bps(),
                                buy_pct = pressure.buy_percentage,
                                sell_pct = pressure.sell_percentage,
                                "Order book status"
                            );
                        }
                    }
                }
            }
        });
    }

    /// Connect and process messages
    async fn connect_and_process(&mut self) -> Result<()> {
        // Connect and subscribe; the feed answers each subscription with a
        // full snapshot before streaming deltas
        self.client.connect().await?;

        // Mark successful connection
        self.last_successful_connection = Some(Instant::now());
        self.reconnect_attempts = 0;
        info!("Feed connected successfully, resetting reconnect counter");

        // Process messages with keepalive
        let mut last_message = Instant::now();
        let keepalive_timeout = Duration::from_secs(30);
        let recv_timeout = Duration::from_secs(45);

        loop {
            // Use timeout to detect stale connections
            match timeout(recv_timeout, self.client.recv()).await {
                Ok(Ok(Some(text))) => {
                    last_message = Instant::now();
                    if let Err(e) = self.process_message(&text).await {
                        warn!(error = %e, "Failed to process message");
                    }
                }
                Ok(Ok(None)) => {
                    // Ping/pong or other non-data message
                    // Send keepalive if no data received for a while
                    if last_message.elapsed() > keepalive_timeout {
                        if let Err(e) = self.client.ping().await {
                            warn!(error = %e, "Failed to send keepalive ping");
                        }
                    }
                    continue;
                }
                Ok(Err(e)) => {
                    // WebSocket error
                    return Err(e);
                }
                Err(_) => {
                    // Timeout - connection might be stale
                    warn!(
                        last_message_secs = last_message.elapsed().as_secs(),
                        "No message received within timeout, sending keepalive"
                    );
                    if let Err(e) = self.client.ping().await {
                        warn!(error = %e, "Failed to send keepalive ping, reconnecting");
                        return Err(crate::error::LadderError::ConnectionTimeout);
                    }
                }
            }
        }
    }

    /// Process a single feed message
    async fn process_message(&self, raw: &str) -> Result<()> {
        let event = parse_event(raw)?;

        let symbol = match event.symbol.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => {
                trace!(msg = %raw, "Message without symbol, skipping");
                return Ok(());
            }
        };

        let mut books = self.state.books.write().await;
        if books.apply(symbol, &event.message) {
            if let Some(view) = books.view(symbol, self.state.config.view_config()) {
                drop(books); // Release lock before publishing
                self.state.publisher.publish(&view).await?;
            }
        }

        Ok(())
    }
}
