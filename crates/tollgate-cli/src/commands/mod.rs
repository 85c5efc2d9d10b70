//! Subcommand implementations.

mod change_password;
mod create_user;
mod login;
mod logout;
mod sessions;
mod whoami;

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use crate::config;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a new user
    CreateUser(create_user::CreateUserArgs),

    /// Log in and store the token pair
    Login(login::LoginArgs),

    /// Display the logged-in user, renewing the access token if needed
    Whoami(whoami::WhoamiArgs),

    /// List the logged-in user's valid sessions
    Sessions(sessions::SessionsArgs),

    /// End the current session, or every session with --all
    Logout(logout::LogoutArgs),

    /// Change the logged-in user's password
    ChangePassword(change_password::ChangePasswordArgs),
}

pub async fn handle(cmd: Command, config_path: Option<&Path>) -> Result<()> {
    let engine = config::open(config_path)?;

    match cmd {
        Command::CreateUser(args) => create_user::run(&engine, args).await,
        Command::Login(args) => login::run(&engine, args).await,
        Command::Whoami(args) => whoami::run(&engine, args).await,
        Command::Sessions(args) => sessions::run(&engine, args).await,
        Command::Logout(args) => logout::run(&engine, args).await,
        Command::ChangePassword(args) => change_password::run(&engine, args).await,
    }
}
