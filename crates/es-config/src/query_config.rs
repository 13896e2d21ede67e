use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

pub const MIN_SCAN_LIMIT: usize = 1;
pub const MAX_SCAN_LIMIT: usize = 1000;
pub const DEFAULT_SCAN_LIMIT: usize = 50;

/// Entity query settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Per-request bound; exceeding it surfaces as RemoteUnavailable
    pub timeout_secs: u64,
    /// Default row limit for scan listings
    pub scan_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }
}

impl QueryConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.timeout_secs < MIN_TIMEOUT_SECS || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::config(format!(
                "query.timeout_secs must be {}-{}, got {}",
                MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, self.timeout_secs
            )));
        }

        if self.scan_limit < MIN_SCAN_LIMIT || self.scan_limit > MAX_SCAN_LIMIT {
            return Err(ConfigError::config(format!(
                "query.scan_limit must be {}-{}, got {}",
                MIN_SCAN_LIMIT, MAX_SCAN_LIMIT, self.scan_limit
            )));
        }

        Ok(())
    }
}
