use crate::{ConfigError, ConfigErrorResult};

use std::fmt::Display;
use std::ops::RangeInclusive;

use serde::Deserialize;

const MAX_ATTEMPTS_RANGE: RangeInclusive<u32> = 1..=20;
const INITIAL_DELAY_MS_RANGE: RangeInclusive<u64> = 10..=10_000;
const MAX_DELAY_SECS_RANGE: RangeInclusive<u64> = 1..=60;
const BACKOFF_MULTIPLIER_RANGE: RangeInclusive<f64> = 1.0..=10.0;

/// Exponential backoff policy for reopening a dropped change feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per outage, counting the first reopen
    pub max_attempts: u32,
    /// Wait before the second attempt, in milliseconds
    pub initial_delay_ms: u64,
    /// Ceiling for any one wait, in seconds
    pub max_delay_secs: u64,
    pub backoff_multiplier: f64,
    /// Add up to 10% random jitter
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 250,
            max_delay_secs: 10,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        within("max_attempts", &MAX_ATTEMPTS_RANGE, self.max_attempts)?;
        within("initial_delay_ms", &INITIAL_DELAY_MS_RANGE, self.initial_delay_ms)?;
        within("max_delay_secs", &MAX_DELAY_SECS_RANGE, self.max_delay_secs)?;
        within(
            "backoff_multiplier",
            &BACKOFF_MULTIPLIER_RANGE,
            self.backoff_multiplier,
        )
    }
}

#[track_caller]
fn within<T>(field: &str, range: &RangeInclusive<T>, value: T) -> ConfigErrorResult<()>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        return Ok(());
    }
    Err(ConfigError::config(format!(
        "realtime.reconnect.{field} must be {}-{}, got {value}",
        range.start(),
        range.end()
    )))
}
