//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use tollgate_core::Credentials;

use crate::config::Engine;
use crate::output;
use crate::session::storage::{self, StoredTokens};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Email address
    #[arg(long)]
    pub email: String,

    /// Password
    #[arg(long)]
    pub password: String,

    /// User agent to record on the session
    #[arg(long, default_value = concat!("tollgate-cli/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,
}

pub async fn run(engine: &Engine, args: LoginArgs) -> Result<()> {
    let credentials = Credentials::new(&args.email, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let login = engine
        .login(&credentials, Some(&args.user_agent))
        .await
        .context("Failed to login")?;

    storage::save_tokens(&StoredTokens::from_login(&login)).context("Failed to save tokens")?;

    output::success("Logged in successfully");
    println!();
    output::field("User", login.user.username.as_str());
    output::field("Session", &login.session.id.to_string());

    Ok(())
}
