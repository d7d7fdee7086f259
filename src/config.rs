//! Configuration module for the depth ladder service

use std::env;

use crate::orderbook::{TotalUnit, DEFAULT_PRESSURE_DEPTH};
use crate::view::{DisplayMode, ViewConfig};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Instruments to subscribe to (e.g., ["BTCUSDT", "ETHUSDT"])
    pub symbols: Vec<String>,

    /// WebSocket endpoint of the order-book feed
    pub ws_endpoint: String,

    /// Unix socket path the rendering surface listens on
    pub ipc_socket_path: String,

    /// Which sides, and at what depth, the published view materializes
    pub display_mode: DisplayMode,

    /// Unit for the per-level running totals
    pub total_unit: TotalUnit,

    /// Levels per side feeding the pressure metrics
    pub pressure_depth: usize,

    /// Base reconnection delay
    pub reconnect_delay_ms: u64,

    /// Interval between per-symbol status log lines, at least one second;
    /// `tokio::time::interval` panics on a zero period
    pub status_interval_secs: u64,

    /// Port of the health/metrics HTTP server
    pub health_port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let symbols: Vec<String> = env::var("SYMBOLS")
            .unwrap_or_else(|_| "BTCUSDT".to_string())
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            symbols,
            ws_endpoint: env::var("WS_ENDPOINT")
                .unwrap_or_else(|_| "ws://127.0.0.1:8765/feed".to_string()),
            ipc_socket_path: env::var("IPC_SOCKET_PATH")
                .unwrap_or_else(|_| "/tmp/book-ladder.sock".to_string()),
            display_mode: env::var("DISPLAY_MODE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DisplayMode::Composite),
            total_unit: env::var("TOTAL_UNIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(TotalUnit::Base),
            pressure_depth: env::var("PRESSURE_DEPTH")
                .unwrap_or_else(|_| DEFAULT_PRESSURE_DEPTH.to_string())
                .parse()
                .unwrap_or(DEFAULT_PRESSURE_DEPTH),
            reconnect_delay_ms: env::var("RECONNECT_DELAY_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
            status_interval_secs: env::var("STATUS_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30)
                .max(1),
            health_port: env::var("HEALTH_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()
                .unwrap_or(9090),
        })
    }

    /// Per-call view configuration derived from the loaded settings.
    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            mode: self.display_mode,
            unit: self.total_unit,
            pressure_depth: self.pressure_depth,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".to_string()],
            ws_endpoint: "ws://127.0.0.1:8765/feed".to_string(),
            ipc_socket_path: "/tmp/book-ladder.sock".to_string(),
            display_mode: DisplayMode::Composite,
            total_unit: TotalUnit::Base,
            pressure_depth: DEFAULT_PRESSURE_DEPTH,
            reconnect_delay_ms: 1000,
            status_interval_secs: 30,
            health_port: 9090,
        }
    }
}
