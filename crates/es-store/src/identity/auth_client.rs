use crate::{AuthSession, AuthUser, IdentityProvider, StoreError, StoreResult};

use es_core::AccessToken;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use reqwest::{Client as ReqwestClient, Method, Url};
use serde::Deserialize;
use serde_json::{Value, json};

/// Token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.expires_in.unwrap_or(3600)));

        AuthSession {
            access_token: AccessToken::new(self.access_token),
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Identity provider client for the hosted auth service (`/auth/v1`)
pub struct AuthClient {
    pub base_url: String,
    anon_key: String,
    client: ReqwestClient,
}

impl AuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client: ReqwestClient::new(),
        }
    }

    fn url(&self, path: &str, grant_type: Option<&str>) -> StoreResult<Url> {
        let mut url = Url::parse(&format!("{}/auth/v1/{}", self.base_url, path))
            .map_err(|e| StoreError::unexpected(format!("invalid auth URL: {e}")))?;
        if let Some(grant_type) = grant_type {
            url.query_pairs_mut().append_pair("grant_type", grant_type);
        }
        Ok(url)
    }

    async fn token(&self, grant_type: &str, body: Value) -> StoreResult<AuthSession> {
        let url = self.url("token", Some(grant_type))?;
        debug!("POST {url}");
        let response = self
            .client
            .request(Method::POST, url)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
            let code = body
                .get("error_code")
                .or_else(|| body.get("error"))
                .and_then(|v| v.as_str())
                .unwrap_or("UNKNOWN");

            if status.as_u16() == 400 && matches!(code, "invalid_grant" | "invalid_credentials") {
                return Err(StoreError::invalid_credentials());
            }

            let message = body
                .get("msg")
                .or_else(|| body.get("error_description"))
                .and_then(|v| v.as_str())
                .unwrap_or("token request failed");
            return Err(StoreError::status(status.as_u16(), code, message));
        }

        let token: TokenResponse = serde_json::from_str(&text)?;
        Ok(token.into_session())
    }
}

#[async_trait]
impl IdentityProvider for AuthClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<AuthSession> {
        self.token("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> StoreResult<AuthSession> {
        self.token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn sign_out(&self, token: &AccessToken) -> StoreResult<()> {
        let url = self.url("logout", None)?;
        debug!("POST {url}");
        let response = self
            .client
            .request(Method::POST, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::status(
                status.as_u16(),
                "LOGOUT_FAILED",
                status.canonical_reason().unwrap_or("logout failed"),
            ));
        }
        Ok(())
    }
}
