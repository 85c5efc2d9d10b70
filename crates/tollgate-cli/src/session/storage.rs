//! Token storage for persisting login state.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use tollgate_core::{AccessToken, LoginOutput, PresentedTokens, RefreshToken};

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

/// Stored token pair.
#[derive(Serialize, Deserialize)]
pub struct StoredTokens {
    pub user_id: String,
    pub session_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl StoredTokens {
    pub fn from_login(login: &LoginOutput) -> Self {
        Self {
            user_id: login.user.id.to_string(),
            session_id: login.session.id.to_string(),
            access_token: login.access_token.as_str().to_string(),
            refresh_token: login.refresh_token.as_str().to_string(),
        }
    }

    pub fn presented(&self) -> PresentedTokens {
        PresentedTokens {
            access: Some(AccessToken::new(self.access_token.as_str())),
            refresh: Some(RefreshToken::new(self.refresh_token.as_str())),
        }
    }
}

/// Get the token file path.
fn tokens_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "tollgate").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("tokens.json"))
}

/// Save tokens to disk, readable by the owner only (Unix).
pub fn save_tokens(tokens: &StoredTokens) -> Result<()> {
    let path = tokens_path()?;
    let json = serde_json::to_string_pretty(tokens)?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(&path).context("Failed to write token file")?;

    // `mode` only applies when the file is created.
    #[cfg(unix)]
    file.set_permissions(fs::Permissions::from_mode(0o600))
        .context("Failed to restrict token file")?;

    file.write_all(json.as_bytes())
        .context("Failed to write token file")?;

    Ok(())
}

/// Load tokens from disk.
pub fn load_tokens() -> Result<Option<StoredTokens>> {
    let path = tokens_path()?;

    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(&path).context("Failed to read token file")?;
    let stored = serde_json::from_str(&json).context("Invalid token file")?;
    Ok(Some(stored))
}

/// Remove the stored tokens.
pub fn clear_tokens() -> Result<()> {
    let path = tokens_path()?;

    if path.exists() {
        fs::remove_file(&path).context("Failed to remove token file")?;
    }

    Ok(())
}
