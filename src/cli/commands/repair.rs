//! `credvault repair`: start over with an empty vault, keeping a copy of
//! the old file.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{load_settings, prompt_new_password, vault_path, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::Vault;

/// Execute the `repair` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Replace {} with an empty vault? A copy of the current file is kept.",
                path.display()
            ))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let password = prompt_new_password()?;
    let mut vault = Vault::new();
    let backup = vault.repair_with(&path, &password, &settings.vault_options())?;

    if let Some(backup) = backup {
        output::info(&format!("Previous file saved as {}", backup.display()));
    }
    output::success(&format!("Empty vault written to {}", path.display()));
    Ok(())
}
