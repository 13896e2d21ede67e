use crate::{ConfigError, ConfigErrorResult, RetryConfig};

use serde::Deserialize;

pub const MIN_HEARTBEAT_INTERVAL_SECS: u64 = 5;
pub const MAX_HEARTBEAT_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 25;

pub const MIN_CHANNEL_BUFFER: usize = 1;
pub const MAX_CHANNEL_BUFFER: usize = 10000;
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Change feed connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Phoenix heartbeat interval
    pub heartbeat_interval_secs: u64,
    /// Per-subscription event buffer; overflow counts as a transport drop
    pub channel_buffer: usize,
    pub reconnect: RetryConfig,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            reconnect: RetryConfig::default(),
        }
    }
}

impl RealtimeConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.heartbeat_interval_secs < MIN_HEARTBEAT_INTERVAL_SECS
            || self.heartbeat_interval_secs > MAX_HEARTBEAT_INTERVAL_SECS
        {
            return Err(ConfigError::config(format!(
                "realtime.heartbeat_interval_secs must be {}-{}, got {}",
                MIN_HEARTBEAT_INTERVAL_SECS,
                MAX_HEARTBEAT_INTERVAL_SECS,
                self.heartbeat_interval_secs
            )));
        }

        if self.channel_buffer < MIN_CHANNEL_BUFFER || self.channel_buffer > MAX_CHANNEL_BUFFER {
            return Err(ConfigError::config(format!(
                "realtime.channel_buffer must be {}-{}, got {}",
                MIN_CHANNEL_BUFFER, MAX_CHANNEL_BUFFER, self.channel_buffer
            )));
        }

        self.reconnect.validate()
    }
}
