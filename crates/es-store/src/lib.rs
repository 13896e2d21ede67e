pub mod error;
pub mod identity;
pub mod store;

pub use error::{Result as StoreResult, StoreError};
pub use identity::auth_client::AuthClient;
pub use identity::auth_session::{AuthSession, AuthUser};
pub use identity::identity_provider::IdentityProvider;
pub use identity::memory_identity::MemoryIdentityProvider;
pub use store::entity_store::EntityStore;
pub use store::memory_store::MemoryStore;
pub use store::rest_store::RestStore;
