mod backend_config;
mod config;
mod error;
mod github_config;
mod log_level;
mod logging_config;
mod plans_config;
mod query_config;
mod realtime_config;
mod retry_config;
mod session_config;

pub use backend_config::BackendConfig;
pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use github_config::GithubConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use plans_config::{PlanLimits, PlansConfig};
pub use query_config::QueryConfig;
pub use realtime_config::RealtimeConfig;
pub use retry_config::RetryConfig;
pub use session_config::SessionConfig;

const CONFIG_DIR_ENV: &str = "ESPRIT_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".esprit";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_COLORED: bool = true;

#[cfg(test)]
mod tests;
