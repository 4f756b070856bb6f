//! `credvault init`: create a new, empty vault.

use std::fs;

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{load_settings, prompt_new_password, vault_path, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::{Vault, VaultFormat};

/// Execute the `init` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;

    // 1. Create the parent directory if it doesn't exist.
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            output::info(&format!("Created directory: {}", dir.display()));
        }
    }

    // 2. An existing vault is only replaced when the user says so.
    if path.exists() && !force {
        let overwrite = Confirm::new()
            .with_prompt(format!(
                "{} already exists. Replace it with an empty vault?",
                path.display()
            ))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !overwrite {
            output::tip("Use `credvault add` to add credentials to the existing vault.");
            return Err(VaultError::UserCancelled);
        }
    }

    // 3. Prompt for a new password (with confirmation).
    let password = prompt_new_password()?;

    // 4. Create and write the vault file.
    let options = settings.vault_options();
    let mut vault = Vault::new();
    vault.create_with(&path, &password, &options)?;

    output::success(&format!("Vault created at {}", path.display()));
    if options.format == VaultFormat::Hardened {
        output::info("Using the hardened format (Argon2id key, HMAC-protected).");
    }

    output::tip("Run `credvault add --title <TITLE>` to add a credential.");
    output::tip("Run `credvault list` to see all credentials.");

    Ok(())
}
