//! Server shared state
//!
//! Holds configuration for the HTTP server.

use crate::config::Config;
use std::time::Instant;
use tokio::sync::RwLock;

/// Shared state for the HTTP server
pub struct AppState {
    /// Configuration
    pub config: RwLock<Config>,

    started: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
            started: Instant::now(),
        }
    }

    /// Snapshot of the current configuration
    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
