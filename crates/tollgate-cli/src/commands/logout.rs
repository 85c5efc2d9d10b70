//! Logout command implementation.

use anyhow::Result;
use clap::Args;
use tracing::warn;

use crate::config::Engine;
use crate::output;
use crate::session::{self, storage};

#[derive(Args, Debug)]
pub struct LogoutArgs {
    /// Invalidate every session of the logged-in user
    #[arg(long)]
    pub all: bool,
}

pub async fn run(engine: &Engine, args: LogoutArgs) -> Result<()> {
    if args.all {
        let (identity, _) = session::authenticate(engine).await?;
        let count = engine.revoke_all(identity.user_id()).await?;
        storage::clear_tokens()?;
        output::success(&format!("Logged out of {} session(s)", count));
        return Ok(());
    }

    match storage::load_tokens() {
        Ok(Some(stored)) => {
            engine.logout(&stored.presented()).await;
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Discarding unreadable token file"),
    }
    storage::clear_tokens()?;
    output::success("Logged out");

    Ok(())
}
