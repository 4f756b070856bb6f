//! `credvault remove`: delete a credential from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_vault, record_index, Access, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `remove` command.
pub fn execute(cli: &Cli, number: usize, force: bool) -> Result<()> {
    let index = record_index(number)?;
    let mut vault = open_vault(cli, Access::Write)?;
    let title = vault.record(index)?.title.clone();

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove #{number} '{title}'?"))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let removed = vault.remove_record(index)?;
    output::success(&format!("Removed '{}'", removed.title));
    if index < vault.count() {
        output::tip("Later records moved up by one number.");
    }

    Ok(())
}
