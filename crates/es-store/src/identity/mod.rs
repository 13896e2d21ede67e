pub mod auth_client;
pub mod auth_session;
pub mod identity_provider;
pub mod memory_identity;
