//! tollgate-file - Filesystem-backed credential and session stores.
//!
//! Both stores can share one root directory; they use separate
//! subdirectories and the same write lock.

mod credentials;
mod sessions;
mod store;

pub use credentials::FileCredentialStore;
pub use sessions::FileSessionStore;
pub use store::FileStore;
