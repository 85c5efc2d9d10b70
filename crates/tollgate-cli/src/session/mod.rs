//! Stored login state and request authentication.

pub mod storage;

use anyhow::{Result, bail};
use tracing::debug;

use tollgate_core::{AuthOutcome, Identity};

use crate::config::Engine;
use storage::StoredTokens;

const NOT_LOGGED_IN: &str = "No active session. Run 'tollgate login' first.";

/// Authenticate the stored tokens the way a server would authenticate a
/// request. A renewed access token is written back to disk.
pub async fn authenticate(engine: &Engine) -> Result<(Identity, StoredTokens)> {
    let Some(mut stored) = storage::load_tokens()? else {
        bail!(NOT_LOGGED_IN);
    };

    match engine.authenticate_request(&stored.presented()).await {
        AuthOutcome::Fresh(identity) => Ok((identity, stored)),
        AuthOutcome::Renewed {
            identity,
            access_token,
        } => {
            debug!("Access token renewed");
            stored.access_token = access_token.as_str().to_string();
            storage::save_tokens(&stored)?;
            Ok((identity, stored))
        }
        AuthOutcome::Rejected(reason) => {
            bail!("Session is no longer valid ({}). Run 'tollgate login' again.", reason)
        }
        AuthOutcome::Unauthenticated => bail!(NOT_LOGGED_IN),
    }
}
