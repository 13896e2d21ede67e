use crate::{
    BackendConfig, CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult,
    DEFAULT_CONFIG_DIR, GithubConfig, LoggingConfig, PlansConfig, QueryConfig, RealtimeConfig,
    SessionConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub query: QueryConfig,
    pub realtime: RealtimeConfig,
    pub github: GithubConfig,
    pub plans: PlansConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for ESPRIT_CONFIG_DIR env var, else use ./.esprit/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply ESPRIT_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: ESPRIT_CONFIG_DIR env var > ./.esprit/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.backend.validate()?;
        self.session.validate()?;
        self.query.validate()?;
        self.realtime.validate()?;
        self.github.validate()?;
        self.plans.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Log configuration summary (NEVER logs secrets).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  backend: {} (api {}, key {})",
            self.backend.url,
            self.backend.api_url,
            if self.backend.anon_key.is_empty() {
                "missing"
            } else {
                "set"
            }
        );
        info!(
            "  session: wait={}s, refresh_margin={}s, request_timeout={}s",
            self.session.wait_secs,
            self.session.refresh_margin_secs,
            self.session.request_timeout_secs
        );
        info!(
            "  query: timeout={}s, scan_limit={}",
            self.query.timeout_secs, self.query.scan_limit
        );
        info!(
            "  realtime: heartbeat={}s, buffer={}",
            self.realtime.heartbeat_interval_secs, self.realtime.channel_buffer
        );
        info!(
            "  reconnect: attempts={}, initial={}ms, max={}s, backoff={}x",
            self.realtime.reconnect.max_attempts,
            self.realtime.reconnect.initial_delay_ms,
            self.realtime.reconnect.max_delay_secs,
            self.realtime.reconnect.backoff_multiplier
        );
        info!(
            "  github: {}",
            if self.github.is_configured() {
                "configured"
            } else {
                "not configured"
            }
        );
        info!(
            "  logging: {} (colored: {})",
            *self.logging.level, self.logging.colored
        );
    }

    fn apply_env_overrides(&mut self) {
        // Backend
        Self::apply_env_string("ESPRIT_BACKEND_URL", &mut self.backend.url);
        Self::apply_env_string("ESPRIT_ANON_KEY", &mut self.backend.anon_key);
        Self::apply_env_string("ESPRIT_API_URL", &mut self.backend.api_url);

        // Session
        Self::apply_env_parse("ESPRIT_SESSION_WAIT_SECS", &mut self.session.wait_secs);
        Self::apply_env_parse(
            "ESPRIT_SESSION_REFRESH_MARGIN_SECS",
            &mut self.session.refresh_margin_secs,
        );
        Self::apply_env_parse(
            "ESPRIT_SESSION_REQUEST_TIMEOUT_SECS",
            &mut self.session.request_timeout_secs,
        );

        // Query
        Self::apply_env_parse("ESPRIT_QUERY_TIMEOUT_SECS", &mut self.query.timeout_secs);
        Self::apply_env_parse("ESPRIT_QUERY_SCAN_LIMIT", &mut self.query.scan_limit);

        // Realtime
        Self::apply_env_parse(
            "ESPRIT_REALTIME_HEARTBEAT_INTERVAL_SECS",
            &mut self.realtime.heartbeat_interval_secs,
        );
        Self::apply_env_parse(
            "ESPRIT_REALTIME_CHANNEL_BUFFER",
            &mut self.realtime.channel_buffer,
        );
        Self::apply_env_parse(
            "ESPRIT_RECONNECT_MAX_ATTEMPTS",
            &mut self.realtime.reconnect.max_attempts,
        );
        Self::apply_env_parse(
            "ESPRIT_RECONNECT_INITIAL_DELAY_MS",
            &mut self.realtime.reconnect.initial_delay_ms,
        );
        Self::apply_env_parse(
            "ESPRIT_RECONNECT_MAX_DELAY_SECS",
            &mut self.realtime.reconnect.max_delay_secs,
        );
        Self::apply_env_parse(
            "ESPRIT_RECONNECT_BACKOFF_MULTIPLIER",
            &mut self.realtime.reconnect.backoff_multiplier,
        );
        Self::apply_env_bool("ESPRIT_RECONNECT_JITTER", &mut self.realtime.reconnect.jitter);

        // GitHub
        Self::apply_env_string("ESPRIT_GITHUB_CLIENT_ID", &mut self.github.client_id);
        Self::apply_env_string("ESPRIT_GITHUB_REDIRECT_URI", &mut self.github.redirect_uri);
        Self::apply_env_string("ESPRIT_GITHUB_API_URL", &mut self.github.api_url);

        // Logging
        Self::apply_env_parse("ESPRIT_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("ESPRIT_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("ESPRIT_LOG_FILE", &mut self.logging.file);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
