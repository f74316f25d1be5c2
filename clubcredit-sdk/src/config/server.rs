//! Server configuration.

use std::net::SocketAddr;

/// Server configuration with runtime values.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address and port to listen on.
    pub listen: SocketAddr,
}

/// Realtime channel tuning.
#[derive(Debug, Clone, Copy)]
pub struct RealtimeConfig {
    /// Per-topic broadcast buffer. A connection that falls further behind
    /// than this is told to resync.
    pub channel_capacity: usize,
    /// Maximum number of live subscriptions on one connection.
    pub max_subscriptions: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            max_subscriptions: 16,
        }
    }
}
