//! Core domain types.
//!
//! These types enforce their invariants at construction time,
//! ensuring invalid states are unrepresentable.

mod email;
mod ids;
mod password;
mod session;
mod user;
mod username;

pub use email::Email;
pub use ids::{SessionId, UserId};
pub use password::validate_password;
pub use session::{PublicSession, Session, SessionRef, normalize_user_agent};
pub use user::{NewUser, PublicUser, UserRecord, UserSecrets, VersionedUser};
pub use username::Username;
