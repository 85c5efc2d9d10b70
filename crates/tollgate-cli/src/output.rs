//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use tollgate_core::types::{PublicSession, PublicUser};

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print the public fields of a user.
pub fn user(user: &PublicUser) {
    field("ID", &user.id.to_string());
    field("Username", user.username.as_str());
    field("Email", user.email.as_str());
}

/// Print one session, marking the one the stored tokens belong to.
pub fn session(session: &PublicSession, current: bool) {
    let marker = if current { " (current)" } else { "" };
    println!("{}{}", session.id.to_string().bold(), marker.green());
    field("  Created", &session.created_at.to_rfc3339());
    field("  User agent", session.user_agent.as_deref().unwrap_or("-"));
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
