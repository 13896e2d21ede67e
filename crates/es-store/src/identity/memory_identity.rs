use crate::{AuthSession, AuthUser, IdentityProvider, StoreError, StoreResult};

use es_core::AccessToken;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

struct Account {
    password: String,
    user: AuthUser,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    /// refresh token -> email
    refresh_tokens: HashMap<String, String>,
    /// access token -> user id, for live sessions only
    access_tokens: HashMap<String, Uuid>,
}

/// In-process identity provider with password accounts.
pub struct MemoryIdentityProvider {
    state: Mutex<State>,
    session_ttl: Mutex<Duration>,
    unavailable: AtomicBool,
    refresh_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self {
            state: Mutex::new(State::default()),
            session_ttl: Mutex::new(Duration::hours(1)),
            unavailable: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account and return its identity id.
    pub fn add_user(&self, email: &str, password: &str, user_metadata: Value) -> Uuid {
        let id = Uuid::new_v4();
        self.state().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: AuthUser {
                    id,
                    email: Some(email.to_string()),
                    user_metadata,
                },
            },
        );
        id
    }

    /// Lifetime of sessions issued from now on.
    pub fn set_session_ttl(&self, ttl: Duration) {
        *self.session_ttl.lock().unwrap_or_else(PoisonError::into_inner) = ttl;
    }

    /// Simulate an outage: every call fails with 503.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Identity behind a live access token.
    pub fn token_owner(&self, token: &AccessToken) -> Option<Uuid> {
        self.state().access_tokens.get(token.as_str()).copied()
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::status(503, "UNAVAILABLE", "identity provider unavailable"));
        }
        Ok(())
    }

    fn issue(&self, state: &mut State, email: &str, user: AuthUser) -> AuthSession {
        let ttl = *self.session_ttl.lock().unwrap_or_else(PoisonError::into_inner);
        let access_token = format!("mem-access-{}", Uuid::new_v4());
        let refresh_token = format!("mem-refresh-{}", Uuid::new_v4());

        state.access_tokens.insert(access_token.clone(), user.id);
        state
            .refresh_tokens
            .insert(refresh_token.clone(), email.to_string());

        AuthSession {
            access_token: AccessToken::new(access_token),
            refresh_token,
            expires_at: Utc::now() + ttl,
            user,
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<AuthSession> {
        self.check_available()?;

        let mut state = self.state();
        let user = match state.accounts.get(email) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(StoreError::invalid_credentials()),
        };
        Ok(self.issue(&mut state, email, user))
    }

    async fn refresh(&self, refresh_token: &str) -> StoreResult<AuthSession> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut state = self.state();
        let Some(email) = state.refresh_tokens.remove(refresh_token) else {
            return Err(StoreError::invalid_credentials());
        };
        let Some(user) = state.accounts.get(&email).map(|a| a.user.clone()) else {
            return Err(StoreError::invalid_credentials());
        };
        Ok(self.issue(&mut state, &email, user))
    }

    async fn sign_out(&self, token: &AccessToken) -> StoreResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        self.state().access_tokens.remove(token.as_str());
        Ok(())
    }
}
