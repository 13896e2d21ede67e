use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const DEFAULT_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/auth/github/callback";
pub const DEFAULT_SCOPE: &str = "repo read:user";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// OAuth application used for repository linking.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Empty means linking is not configured
    pub client_id: String,
    pub authorize_url: String,
    pub redirect_uri: String,
    pub scope: String,
    pub api_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            authorize_url: String::from(DEFAULT_AUTHORIZE_URL),
            redirect_uri: String::from(DEFAULT_REDIRECT_URI),
            scope: String::from(DEFAULT_SCOPE),
            api_url: String::from(DEFAULT_GITHUB_API_URL),
        }
    }
}

impl GithubConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty()
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        for (name, value) in [
            ("github.authorize_url", &self.authorize_url),
            ("github.redirect_uri", &self.redirect_uri),
            ("github.api_url", &self.api_url),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError::github(format!(
                    "{name} must be an http(s) URL, got '{value}'"
                )));
            }
        }

        if self.scope.trim().is_empty() {
            return Err(ConfigError::github("github.scope cannot be empty"));
        }

        Ok(())
    }
}
