use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const MIN_WAIT_SECS: u64 = 1;
pub const MAX_WAIT_SECS: u64 = 60;
pub const DEFAULT_WAIT_SECS: u64 = 5;

pub const MIN_REFRESH_MARGIN_SECS: u64 = 0;
pub const MAX_REFRESH_MARGIN_SECS: u64 = 600;
pub const DEFAULT_REFRESH_MARGIN_SECS: u64 = 60;

pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound for `current_identity()` while the session is initializing
    pub wait_secs: u64,
    /// Refresh the access token when it expires within this many seconds
    pub refresh_margin_secs: u64,
    /// Bound on sign-in, token refresh and profile reads
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wait_secs: DEFAULT_WAIT_SECS,
            refresh_margin_secs: DEFAULT_REFRESH_MARGIN_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.wait_secs < MIN_WAIT_SECS || self.wait_secs > MAX_WAIT_SECS {
            return Err(ConfigError::config(format!(
                "session.wait_secs must be {}-{}, got {}",
                MIN_WAIT_SECS, MAX_WAIT_SECS, self.wait_secs
            )));
        }

        if self.refresh_margin_secs < MIN_REFRESH_MARGIN_SECS
            || self.refresh_margin_secs > MAX_REFRESH_MARGIN_SECS
        {
            return Err(ConfigError::config(format!(
                "session.refresh_margin_secs must be {}-{}, got {}",
                MIN_REFRESH_MARGIN_SECS, MAX_REFRESH_MARGIN_SECS, self.refresh_margin_secs
            )));
        }

        if self.request_timeout_secs < MIN_REQUEST_TIMEOUT_SECS
            || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS
        {
            return Err(ConfigError::config(format!(
                "session.request_timeout_secs must be {}-{}, got {}",
                MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS, self.request_timeout_secs
            )));
        }

        Ok(())
    }
}
