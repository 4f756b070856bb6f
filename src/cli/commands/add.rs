//! `credvault add`: store a new credential.

use crate::cli::commands::resolve_secret;
use crate::cli::output;
use crate::cli::{open_vault, Access, Cli, SecretArgs};
use crate::errors::{Result, VaultError};
use crate::vault::CredentialRecord;

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    title: &str,
    username: Option<&str>,
    site: Option<&str>,
    secret: &SecretArgs,
) -> Result<()> {
    // Check the cheap stuff before asking for any password.
    if title.trim().is_empty() {
        return Err(VaultError::InvalidRecord("title cannot be empty".into()));
    }

    let mut vault = open_vault(cli, Access::Write)?;

    let secret = resolve_secret(secret, false)?
        .ok_or_else(|| VaultError::InvalidRecord("secret cannot be empty".into()))?;
    let record = CredentialRecord::new(
        title,
        username.map(String::from),
        secret.as_str(),
        site.map(String::from),
    );

    vault.add_record(record)?;

    output::success(&format!("Added '{title}' as #{}", vault.count()));
    Ok(())
}
