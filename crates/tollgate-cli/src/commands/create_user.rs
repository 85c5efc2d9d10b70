//! Create user command implementation.

use anyhow::{Context, Result};
use clap::Args;

use tollgate_core::NewUser;

use crate::config::Engine;
use crate::output;

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    /// Username (at most 64 characters)
    #[arg(long)]
    pub username: String,

    /// Email address, used to log in
    #[arg(long)]
    pub email: String,

    /// Password (10-64 characters with upper, lower, digit, and special)
    #[arg(long)]
    pub password: String,
}

pub async fn run(engine: &Engine, args: CreateUserArgs) -> Result<()> {
    let new_user = NewUser::new(&args.username, &args.email, &args.password)?;
    let user = engine
        .register(new_user)
        .await
        .context("Failed to create user")?;

    output::user(&user);
    output::success("User created successfully");

    Ok(())
}
