//! The `ratewise login` and `ratewise logout` commands.

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use ratewise_core::identity::{Role, SessionIdentity};

use super::Context;

pub fn execute(
    config_path: Option<PathBuf>,
    username: String,
    role: String,
    pm_id: Option<String>,
) -> Result<()> {
    let ctx = Context::load(config_path)?;
    if username.trim().is_empty() {
        anyhow::bail!("username must not be empty");
    }
    let role: Role = role.parse().map_err(anyhow::Error::msg)?;

    let current = ctx.identity()?;
    let identity = SessionIdentity {
        username: Some(username.trim().to_string()),
        role: Some(role),
        pm_id: pm_id.unwrap_or(current.pm_id),
    };
    identity
        .save(ctx.store.as_ref())
        .context("failed to store the session")?;

    println!(
        "Logged in as {} ({role}), PM {}",
        username.trim(),
        identity.pm_id
    );
    Ok(())
}

pub fn logout(config_path: Option<PathBuf>) -> Result<()> {
    let ctx = Context::load(config_path)?;
    SessionIdentity::clear(ctx.store.as_ref()).context("failed to clear the session")?;
    println!("Logged out.");
    Ok(())
}
