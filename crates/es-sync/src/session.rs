use crate::query::bounded;
use crate::{Coalescer, SyncError, SyncResult};

use es_config::SessionConfig;
use es_core::{AccessToken, Entity, EntityKind, Filter, NewProfile, Profile, Query};
use es_store::{AuthSession, EntityStore, IdentityProvider};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use log::{debug, info, warn};
use tokio::sync::watch;
use uuid::Uuid;

/// Lifecycle of the acting identity.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Initializing,
    Unauthenticated,
    Authenticated(Profile),
    Failed(String),
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated(_) => "authenticated",
            Self::Failed(_) => "failed",
        }
    }
}

/// Handle returned by [`SessionContext::register_subscription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What a request needs to act on behalf of the current identity.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: Uuid,
    pub token: AccessToken,
    pub epoch: u64,
}

type Closer = Box<dyn FnOnce() + Send>;

/// Who is acting.
///
/// One per process, shared as `Arc<SessionContext>` by every component that
/// talks to the backend. The epoch advances whenever the identity changes;
/// work started under an older epoch must be discarded.
pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn EntityStore>,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
    auth: Mutex<Option<AuthSession>>,
    epoch: AtomicU64,
    subscriptions: Mutex<HashMap<SubscriptionId, Closer>>,
    next_subscription: AtomicU64,
    profile_fetch: Coalescer<Profile>,
    token_refresh: tokio::sync::Mutex<()>,
}

impl SessionContext {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn EntityStore>,
        config: SessionConfig,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::Initializing);
        Arc::new(Self {
            provider,
            store,
            config,
            state,
            auth: Mutex::new(None),
            epoch: AtomicU64::new(0),
            subscriptions: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(0),
            profile_fetch: Coalescer::new(),
            token_refresh: tokio::sync::Mutex::new(()),
        })
    }

    fn auth(&self) -> MutexGuard<'_, Option<AuthSession>> {
        self.auth.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscriptions(&self) -> MutexGuard<'_, HashMap<SubscriptionId, Closer>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    fn set_state(&self, state: SessionState) {
        debug!("Session state -> {}", state.as_str());
        self.state.send_replace(state);
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> SyncResult<Profile> {
        let result = bounded(
            self.request_timeout(),
            "sign in",
            self.provider.sign_in_with_password(email, password),
        )
        .await;
        self.establish(result).await
    }

    /// Re-establish a session from a stored refresh token.
    pub async fn restore(&self, refresh_token: &str) -> SyncResult<Profile> {
        let result = bounded(
            self.request_timeout(),
            "restore session",
            self.provider.refresh(refresh_token),
        )
        .await;
        self.establish(result).await
    }

    async fn establish(&self, result: SyncResult<AuthSession>) -> SyncResult<Profile> {
        let session = match result {
            Ok(session) => session,
            Err(err) => {
                if err.kind() == es_core::ErrorKind::Unauthorized {
                    self.set_state(SessionState::Unauthenticated);
                } else {
                    self.set_state(SessionState::Failed(err.to_string()));
                }
                return Err(err);
            }
        };

        let profile = match self.load_or_create_profile(&session).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Profile load failed for {}: {}", session.user.id, e);
                self.set_state(SessionState::Failed(e.to_string()));
                return Err(e);
            }
        };

        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self.auth() = Some(session);
        info!("Signed in as {} ({})", profile.display_name(), profile.id);
        self.set_state(SessionState::Authenticated(profile.clone()));
        Ok(profile)
    }

    async fn load_or_create_profile(&self, session: &AuthSession) -> SyncResult<Profile> {
        let user = &session.user;
        let timeout = self.request_timeout();
        if let Some(profile) =
            fetch_profile(self.store.as_ref(), &session.access_token, user.id, timeout).await?
        {
            return Ok(profile);
        }

        let mut fields = NewProfile::new(user.id, user.email.clone().unwrap_or_default());
        fields.full_name = user.full_name();
        fields.avatar_url = user.avatar_url();

        info!("Creating profile for first sign-in of {}", user.id);
        let row = bounded(
            timeout,
            "create profile",
            self.store.insert(
                &session.access_token,
                EntityKind::Profile,
                serde_json::to_value(&fields)?,
            ),
        )
        .await?;
        Ok(Profile::from_row(row)?)
    }

    /// The acting identity, waiting up to `session.wait_secs` while the
    /// context is still initialising.
    pub async fn current_identity(&self) -> SyncResult<Option<Profile>> {
        let mut rx = self.state.subscribe();
        let wait = Duration::from_secs(self.config.wait_secs);

        let state = match tokio::time::timeout(
            wait,
            rx.wait_for(|s| !matches!(s, SessionState::Initializing)),
        )
        .await
        {
            Ok(Ok(state)) => state.clone(),
            Ok(Err(_)) => return Ok(None),
            Err(_) => {
                debug!("Session still initializing after {}s", self.config.wait_secs);
                return Ok(None);
            }
        };

        match state {
            SessionState::Authenticated(profile) => Ok(Some(profile)),
            SessionState::Failed(reason) => Err(SyncError::unavailable(reason)),
            SessionState::Initializing | SessionState::Unauthenticated => Ok(None),
        }
    }

    pub fn identity_now(&self) -> Option<Profile> {
        match &*self.state.borrow() {
            SessionState::Authenticated(profile) => Some(profile.clone()),
            _ => None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// `Unauthorized` when `epoch` is no longer current.
    #[track_caller]
    pub fn check_epoch(&self, epoch: u64) -> SyncResult<()> {
        if self.epoch() != epoch {
            return Err(SyncError::unauthorized("session changed while request was in flight"));
        }
        Ok(())
    }

    /// Refresh token of the live session, for persisting between runs.
    pub fn refresh_token(&self) -> Option<String> {
        self.auth().as_ref().map(|s| s.refresh_token.clone())
    }

    /// Bearer credential, renewed through the provider when it is about to
    /// expire.
    pub async fn access_token(&self) -> SyncResult<AccessToken> {
        let margin = chrono::Duration::seconds(self.config.refresh_margin_secs as i64);
        let session = self
            .auth()
            .clone()
            .ok_or_else(|| SyncError::unauthorized("not signed in"))?;
        if !session.expires_within(margin) {
            return Ok(session.access_token);
        }

        let _refreshing = self.token_refresh.lock().await;
        let epoch = self.epoch();

        // Another caller may have refreshed while we waited.
        let session = self
            .auth()
            .clone()
            .ok_or_else(|| SyncError::unauthorized("not signed in"))?;
        if !session.expires_within(margin) {
            return Ok(session.access_token);
        }

        debug!("Access token expires within {}s, refreshing", margin.num_seconds());
        let renewed = bounded(
            self.request_timeout(),
            "refresh token",
            self.provider.refresh(&session.refresh_token),
        )
        .await?;
        self.check_epoch(epoch)?;

        let token = renewed.access_token.clone();
        *self.auth() = Some(renewed);
        Ok(token)
    }

    pub async fn credentials(&self) -> SyncResult<Credentials> {
        let epoch = self.epoch();
        let user_id = self
            .identity_now()
            .map(|p| p.id)
            .ok_or_else(|| SyncError::unauthorized("not signed in"))?;
        let token = self.access_token().await?;
        self.check_epoch(epoch)?;
        Ok(Credentials {
            user_id,
            token,
            epoch,
        })
    }

    /// Re-read the profile. Concurrent callers share one request.
    pub async fn refresh_profile(&self) -> SyncResult<Profile> {
        let creds = self.credentials().await?;
        let store = Arc::clone(&self.store);
        let token = creds.token.clone();
        let user_id = creds.user_id;
        let timeout = self.request_timeout();

        let profile = self
            .profile_fetch
            .run(user_id.to_string(), move || {
                async move {
                    fetch_profile(store.as_ref(), &token, user_id, timeout)
                        .await?
                        .ok_or_else(|| SyncError::not_found("profile", user_id))
                }
                .boxed()
            })
            .await?;

        self.check_epoch(creds.epoch)?;
        self.state.send_if_modified(|state| match state {
            SessionState::Authenticated(current) if current.id == profile.id => {
                let changed = *current != profile;
                *current = profile.clone();
                changed
            }
            _ => false,
        });
        Ok(profile)
    }

    /// Tear down the identity: bump the epoch, close every registered
    /// subscription, then best-effort invalidate the remote session.
    pub async fn sign_out(&self) {
        let session = self.auth().take();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.set_state(SessionState::Unauthenticated);

        let closers: Vec<Closer> = self.subscriptions().drain().map(|(_, c)| c).collect();
        let closed = closers.len();
        for close in closers {
            close();
        }
        info!("Signed out, closed {} subscriptions", closed);

        if let Some(session) = session
            && let Err(e) = bounded(
                self.request_timeout(),
                "remote sign-out",
                self.provider.sign_out(&session.access_token),
            )
            .await
        {
            warn!("Remote sign-out failed: {}", e);
        }
    }

    /// Register a subscription to be closed on sign-out.
    pub fn register_subscription(&self, closer: Box<dyn FnOnce() + Send>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.subscriptions().insert(id, closer);
        id
    }

    pub fn unregister_subscription(&self, id: SubscriptionId) {
        self.subscriptions().remove(&id);
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions().len()
    }
}

async fn fetch_profile(
    store: &dyn EntityStore,
    token: &AccessToken,
    user_id: Uuid,
    timeout: Duration,
) -> SyncResult<Option<Profile>> {
    let query = Query::new()
        .filter(Filter::eq("id", user_id.to_string()))
        .limit(1);
    let rows = bounded(
        timeout,
        "fetch profile",
        store.select(token, EntityKind::Profile, &query),
    )
    .await?;
    rows.into_iter()
        .next()
        .map(Profile::from_row)
        .transpose()
        .map_err(SyncError::from)
}
