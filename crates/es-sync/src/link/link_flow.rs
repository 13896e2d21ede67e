use super::code_exchange::CodeExchange;
use super::correlation_store::CorrelationStore;
use super::link_state::LinkState;
use crate::query::bounded;
use crate::{QueryService, SessionContext, SyncError, SyncMetrics, SyncResult};

use es_config::GithubConfig;
use es_core::{CoreError, ErrorKind, LinkedRepository, Profile};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use log::{debug, info, warn};
use reqwest::Url;
use serde_json::json;
use uuid::Uuid;

/// Query parameters GitHub appends to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl OAuthCallback {
    pub fn new(code: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            state: Some(state.into()),
            ..Self::default()
        }
    }

    /// Parse the full redirect URL the browser landed on.
    pub fn from_url(url: &str) -> SyncResult<Self> {
        let url = Url::parse(url).map_err(|e| {
            SyncError::from(CoreError::validation(
                format!("invalid callback URL: {e}"),
                Some("callback"),
            ))
        })?;

        let mut callback = Self::default();
        for (key, value) in url.query_pairs() {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => callback.code = value,
                "state" => callback.state = value,
                "error" => callback.error = value,
                "error_description" => callback.error_description = value,
                _ => {}
            }
        }
        Ok(callback)
    }
}

/// Links the signed-in identity to a GitHub account through the OAuth
/// authorization-code flow.
pub struct LinkFlow {
    session: Arc<SessionContext>,
    queries: Arc<QueryService>,
    correlation: Arc<dyn CorrelationStore>,
    exchange: Arc<dyn CodeExchange>,
    github: GithubConfig,
    state: Mutex<LinkState>,
    metrics: SyncMetrics,
}

impl LinkFlow {
    pub fn new(
        queries: Arc<QueryService>,
        correlation: Arc<dyn CorrelationStore>,
        exchange: Arc<dyn CodeExchange>,
        github: GithubConfig,
    ) -> Self {
        Self {
            session: Arc::clone(queries.session()),
            queries,
            correlation,
            exchange,
            github,
            state: Mutex::new(LinkState::NotStarted),
            metrics: SyncMetrics::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, LinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: LinkState) {
        debug!("GitHub link -> {}", state);
        *self.lock_state() = state;
    }

    fn fail(&self, err: &SyncError) {
        self.metrics.link_finished(err.kind().as_str());
        self.set_state(LinkState::Failed {
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    /// Begin linking; returns the URL to send the user to.
    ///
    /// Fails with `Unauthorized` and touches nothing when no one is signed in.
    pub fn start(&self) -> SyncResult<String> {
        let profile = self
            .session
            .identity_now()
            .ok_or_else(|| SyncError::unauthorized("sign in before connecting GitHub"))?;

        let result = self.authorize_url();
        match &result {
            Ok(_) => {
                info!("GitHub link started for {}", profile.id);
                self.set_state(LinkState::AwaitingRedirect);
            }
            Err(e) => self.fail(e),
        }
        result
    }

    fn authorize_url(&self) -> SyncResult<String> {
        if !self.github.is_configured() {
            return Err(SyncError::not_configured("GitHub OAuth not configured"));
        }

        let state = Uuid::new_v4().to_string();
        let url = Url::parse_with_params(
            &self.github.authorize_url,
            &[
                ("client_id", self.github.client_id.as_str()),
                ("redirect_uri", self.github.redirect_uri.as_str()),
                ("scope", self.github.scope.as_str()),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| SyncError::not_configured(format!("invalid github.authorize_url: {e}")))?;

        self.correlation.save(&state)?;
        Ok(url.into())
    }

    /// The user has been sent to GitHub; the next step is the callback.
    pub fn redirected(&self) {
        let mut state = self.lock_state();
        if *state == LinkState::AwaitingRedirect {
            *state = LinkState::AwaitingCallback;
        }
    }

    /// Finish linking with the parameters of the OAuth redirect.
    ///
    /// The stored correlation token is consumed whatever the outcome, so a
    /// callback can be replayed at most once.
    pub async fn complete(&self, callback: OAuthCallback) -> SyncResult<Profile> {
        match self.finish(callback).await {
            Ok((profile, username)) => {
                info!("GitHub account {} linked to {}", username, profile.id);
                self.metrics.link_finished("linked");
                self.set_state(LinkState::Linked { username });
                Ok(profile)
            }
            Err(e) => {
                warn!("GitHub link failed: {}", e);
                self.fail(&e);
                Err(e)
            }
        }
    }

    async fn finish(&self, callback: OAuthCallback) -> SyncResult<(Profile, String)> {
        self.set_state(LinkState::AwaitingCallback);

        let expected = self.correlation.take()?;
        match (expected.as_deref(), callback.state.as_deref()) {
            (Some(expected), Some(received)) if expected == received => {}
            _ => return Err(SyncError::csrf_mismatch()),
        }

        if let Some(error) = callback.error {
            let description = callback.error_description.unwrap_or_default();
            return Err(SyncError::exchange_rejected(format!("{error}: {description}")));
        }
        let code = callback
            .code
            .filter(|code| !code.is_empty())
            .ok_or_else(|| SyncError::exchange_rejected("No authorization code received"))?;

        let creds = self.session.credentials().await?;
        self.set_state(LinkState::ExchangingCode);
        let grant = bounded(
            self.queries.timeout(),
            "code exchange",
            self.exchange.exchange(&creds.token, &code),
        )
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::ExchangeRejected => e,
            _ => SyncError::exchange_rejected(e.to_string()),
        })?;

        self.queries
            .update_entity::<Profile>(
                creds.user_id,
                json!({
                    "github_access_token": grant.access_token,
                    "github_username": grant.username,
                    "github_connected_at": Utc::now().to_rfc3339(),
                }),
            )
            .await?;

        let profile = self.session.refresh_profile().await?;
        Ok((profile, grant.username))
    }

    /// Forget the GitHub account and every repository linked through it.
    pub async fn disconnect(&self) -> SyncResult<Profile> {
        let creds = self.session.credentials().await?;

        self.queries
            .update_entity::<Profile>(
                creds.user_id,
                json!({
                    "github_access_token": null,
                    "github_username": null,
                    "github_connected_at": null,
                }),
            )
            .await?;
        let removed = self
            .queries
            .delete_matching::<LinkedRepository>(Vec::new())
            .await?;

        info!("GitHub disconnected for {}, unlinked {} repositories", creds.user_id, removed);
        self.set_state(LinkState::NotStarted);
        self.session.refresh_profile().await
    }
}
