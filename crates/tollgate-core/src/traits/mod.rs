//! Storage contracts consumed by the session engine.

mod credential_store;
mod session_store;

pub use credential_store::CredentialStore;
pub use session_store::SessionStore;
