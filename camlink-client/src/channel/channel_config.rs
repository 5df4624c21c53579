use camlink_core::utils::{CONNECT_TIMEOUT, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Relay WebSocket url, e.g. `ws://192.168.1.10:3000/camera`.
    pub url: String,
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
    pub connect_timeout: Duration,
    pub outbound_capacity: usize,
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:3000/camera".to_owned(),
            reconnect_delay: RECONNECT_DELAY,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            connect_timeout: CONNECT_TIMEOUT,
            outbound_capacity: 64,
        }
    }
}
