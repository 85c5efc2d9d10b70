//! Change password command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::config::Engine;
use crate::output;
use crate::session::{self, storage};

#[derive(Args, Debug)]
pub struct ChangePasswordArgs {
    /// Current password
    #[arg(long)]
    pub current: String,

    /// New password
    #[arg(long)]
    pub new: String,
}

pub async fn run(engine: &Engine, args: ChangePasswordArgs) -> Result<()> {
    let (identity, _) = session::authenticate(engine).await?;

    engine
        .change_password(identity.user_id(), &args.current, &args.new)
        .await
        .context("Failed to change password")?;

    // Every token issued before the change is now stale.
    storage::clear_tokens()?;

    output::success("Password changed. Log in again with the new password.");

    Ok(())
}
