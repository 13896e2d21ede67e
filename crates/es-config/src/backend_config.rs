use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:54321";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Where the hosted backend lives.
///
/// `url` serves auth, REST tables and the realtime socket; `api_url` is the
/// application API that performs privileged exchanges.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    /// Public (anonymous) project key sent as `apikey`
    pub anon_key: String,
    pub api_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::from(DEFAULT_BACKEND_URL),
            anon_key: String::new(),
            api_url: String::from(DEFAULT_API_URL),
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &if self.anon_key.is_empty() { "" } else { "***" })
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl BackendConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        for (name, value) in [("backend.url", &self.url), ("backend.api_url", &self.api_url)] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError::backend(format!(
                    "{name} must be an http(s) URL, got '{value}'"
                )));
            }
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn api_base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
