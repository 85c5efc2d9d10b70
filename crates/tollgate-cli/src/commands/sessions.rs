//! Sessions command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::Engine;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct SessionsArgs {
    /// Print one JSON object per line
    #[arg(long)]
    pub json: bool,
}

pub async fn run(engine: &Engine, args: SessionsArgs) -> Result<()> {
    let (identity, stored) = session::authenticate(engine).await?;
    let sessions = engine
        .list_sessions(identity.user_id())
        .await
        .context("Failed to list sessions")?;

    if args.json {
        for s in &sessions {
            output::json(s)?;
        }
        return Ok(());
    }

    if sessions.is_empty() {
        eprintln!("{}", "No valid sessions".dimmed());
        return Ok(());
    }

    for s in &sessions {
        output::session(s, s.id.to_string() == stored.session_id);
    }

    Ok(())
}
