//! `credvault update`: change fields of an existing credential.

use crate::cli::commands::resolve_secret;
use crate::cli::output;
use crate::cli::{open_vault, record_index, Access, Cli, SecretArgs};
use crate::errors::Result;
use crate::vault::CredentialRecord;

/// Field changes requested on the command line.  `None` keeps a field.
pub struct Changes<'a> {
    pub title: Option<&'a str>,
    pub username: Option<&'a str>,
    pub site: Option<&'a str>,
}

/// Execute the `update` command.
pub fn execute(cli: &Cli, number: usize, changes: &Changes<'_>, secret: &SecretArgs) -> Result<()> {
    let index = record_index(number)?;
    let mut vault = open_vault(cli, Access::Write)?;

    let current = vault.record(index)?;
    let new_secret = resolve_secret(secret, true)?;

    let record = CredentialRecord::with_created_at(
        changes.title.unwrap_or(current.title.as_str()),
        changes
            .username
            .map(String::from)
            .or_else(|| current.username.clone()),
        new_secret
            .as_deref()
            .map(String::as_str)
            .unwrap_or(current.secret.as_str()),
        changes.site.map(String::from).or_else(|| current.site.clone()),
        current.created_at,
    );

    let title = record.title.clone();
    vault.update_record(index, record)?;

    output::success(&format!("Updated #{number} '{title}'"));
    Ok(())
}
