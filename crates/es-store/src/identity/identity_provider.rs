use crate::{AuthSession, StoreResult};

use es_core::AccessToken;

use async_trait::async_trait;

/// Issues and renews sessions for an identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
    -> StoreResult<AuthSession>;

    /// Exchange a refresh token for a fresh session.
    async fn refresh(&self, refresh_token: &str) -> StoreResult<AuthSession>;

    /// Invalidate the remote session.
    async fn sign_out(&self, token: &AccessToken) -> StoreResult<()>;
}
