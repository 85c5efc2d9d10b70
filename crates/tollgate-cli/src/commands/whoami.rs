//! Whoami command implementation.

use anyhow::Result;
use clap::Args;

use crate::config::Engine;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the user as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(engine: &Engine, args: WhoamiArgs) -> Result<()> {
    let (identity, stored) = session::authenticate(engine).await?;
    let user = identity.user;

    if args.json {
        return output::json_pretty(&user);
    }

    output::user(&user);
    output::field("Session", &stored.session_id);

    Ok(())
}
