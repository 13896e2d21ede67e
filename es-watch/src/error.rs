use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Config error: {0}")]
    Config(#[from] es_config::ConfigError),

    #[error("{0}")]
    Sync(#[from] es_sync::SyncError),

    #[error("Subscription {name} closed: {message}")]
    View { name: String, message: String },

    #[error("{message}")]
    QuotaExceeded { message: String },

    #[error("Invalid arguments: {message}")]
    Arguments { message: String },

    #[error("Environment variable error: {message}")]
    EnvVar { message: String },

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to initialize logger: {message}")]
    Logger { message: String },
}

pub type Result<T> = std::result::Result<T, WatchError>;
