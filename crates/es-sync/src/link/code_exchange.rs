use crate::{SyncError, SyncResult};

use es_core::AccessToken;

use async_trait::async_trait;
use log::debug;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use serde_json::{Value, json};

const CALLBACK_PATH: &str = "/api/v1/github/callback";

/// Result of trading an authorization code for a GitHub token.
#[derive(Clone, Deserialize, PartialEq)]
pub struct GithubGrant {
    pub access_token: String,
    pub username: String,
}

impl std::fmt::Debug for GithubGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubGrant")
            .field("access_token", &"***")
            .field("username", &self.username)
            .finish()
    }
}

/// Server-side half of the OAuth handshake. The client secret never leaves
/// the backend, so the code is exchanged through an authenticated call.
#[async_trait]
pub trait CodeExchange: Send + Sync {
    async fn exchange(&self, token: &AccessToken, code: &str) -> SyncResult<GithubGrant>;
}

pub struct HttpCodeExchange {
    api_url: String,
    client: ReqwestClient,
}

impl HttpCodeExchange {
    /// # Arguments
    /// * `api_url` - Backend API root (e.g., "https://api.esprit.dev")
    pub fn new(api_url: &str) -> Self {
        Self::with_client(api_url, ReqwestClient::new())
    }

    pub fn with_client(api_url: &str, client: ReqwestClient) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl CodeExchange for HttpCodeExchange {
    async fn exchange(&self, token: &AccessToken, code: &str) -> SyncResult<GithubGrant> {
        let url = format!("{}{}", self.api_url, CALLBACK_PATH);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.as_str())
            .json(&json!({ "code": code }))
            .send()
            .await
            .map_err(|e| SyncError::unavailable(format!("code exchange: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::unavailable(format!("code exchange: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| body.get("detail").and_then(Value::as_str).map(String::from))
                .unwrap_or_else(|| "Failed to exchange code".to_string());
            return Err(SyncError::exchange_rejected(format!(
                "{detail} (status {})",
                status.as_u16()
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| SyncError::exchange_rejected(format!("malformed exchange response: {e}")))
    }
}
