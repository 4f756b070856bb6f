//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::vault::{OpenStatus, Vault};

/// Minimum passphrase length for new vaults.
const MIN_PASSWORD_LEN: usize = 6;

/// Environment variable holding the vault passphrase (scripts and CI).
pub const PASSWORD_ENV: &str = "CREDVAULT_PASSWORD";

/// credvault CLI: encrypted credential vault.
#[derive(Parser)]
#[command(name = "credvault", about = "Encrypted credential vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault file (default: `default_vault` from .credvault.toml, else credentials.vault)
    #[arg(long, global = true, env = "CREDVAULT_VAULT")]
    pub vault: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init {
        /// Overwrite an existing vault without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Add a credential
    Add {
        /// Title shown in listings (e.g. "Mail")
        #[arg(short, long)]
        title: String,
        /// Login name
        #[arg(short, long)]
        username: Option<String>,
        /// Website or host
        #[arg(short, long)]
        site: Option<String>,
        #[command(flatten)]
        secret: SecretArgs,
    },

    /// List credentials, optionally filtered by a search term
    List {
        /// Case-insensitive match against title, username and site
        term: Option<String>,
        /// Print JSON instead of a table (secrets are never included)
        #[arg(long)]
        json: bool,
    },

    /// Show one credential, including its secret
    Show {
        /// Record number as shown by `list`
        index: usize,
    },

    /// Change fields of a credential
    Update {
        /// Record number as shown by `list`
        index: usize,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New login name (empty string clears it)
        #[arg(short, long)]
        username: Option<String>,
        /// New website or host (empty string clears it)
        #[arg(short, long)]
        site: Option<String>,
        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Remove a credential
    Remove {
        /// Record number as shown by `list`
        index: usize,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Replace an unreadable vault with an empty one (keeps a copy)
    Repair {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Generate a random password
    Generate {
        #[command(flatten)]
        options: GeneratorArgs,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Where a new secret comes from.
#[derive(clap::Args, Debug, Default)]
pub struct SecretArgs {
    /// Secret value (omit for interactive prompt)
    #[arg(long, conflicts_with = "generate")]
    pub secret: Option<String>,

    /// Generate a random secret instead
    #[arg(short, long)]
    pub generate: bool,

    #[command(flatten)]
    pub generator: GeneratorArgs,
}

/// Password generator switches.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct GeneratorArgs {
    /// Password length
    #[arg(short, long, default_value_t = 16)]
    pub length: usize,
    /// Leave out A-Z
    #[arg(long)]
    pub no_uppercase: bool,
    /// Leave out a-z
    #[arg(long)]
    pub no_lowercase: bool,
    /// Leave out 0-9
    #[arg(long)]
    pub no_digits: bool,
    /// Leave out symbols
    #[arg(long)]
    pub no_symbols: bool,
}

impl Default for GeneratorArgs {
    fn default() -> Self {
        Self {
            length: 16,
            no_uppercase: false,
            no_lowercase: false,
            no_digits: false,
            no_symbols: false,
        }
    }
}

impl GeneratorArgs {
    pub fn options(&self) -> crate::generator::GeneratorOptions {
        crate::generator::GeneratorOptions {
            length: self.length,
            uppercase: !self.no_uppercase,
            lowercase: !self.no_lowercase,
            digits: !self.no_digits,
            symbols: !self.no_symbols,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the vault passphrase, trying in order:
/// 1. `CREDVAULT_PASSWORD` env var (scripts and CI)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter vault password")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new passphrase with confirmation (used by `init` and `repair`).
///
/// Also respects `CREDVAULT_PASSWORD`.  Enforces a minimum length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        if pw.chars().count() < MIN_PASSWORD_LEN {
            return Err(VaultError::CommandFailed(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose vault password")
                .with_confirmation(
                    "Confirm vault password",
                    "Passwords do not match, try again",
                )
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if password.chars().count() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(password);
    }
}

fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Load `.credvault.toml` from the working directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Resolve the vault file: `--vault` if given, else the configured default.
pub fn vault_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    match &cli.vault {
        Some(path) => Ok(path.clone()),
        None => {
            let cwd = std::env::current_dir()?;
            Ok(settings.vault_path(&cwd))
        }
    }
}

/// Whether a command only reads the vault or writes it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Open the vault for a command, reporting what `open` found.
///
/// After a Recovery, read commands continue on the (empty) vault with a
/// warning; write commands stop, since saving would replace the unreadable
/// file.
pub fn open_vault(cli: &Cli, access: Access) -> Result<Vault> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;
    if !path.exists() {
        output::tip("Run `credvault init` to create a vault.");
        return Err(VaultError::NotFound(path));
    }

    let password = prompt_password()?;
    let mut vault = Vault::new();
    let status = vault.open_with(&path, &password, &settings.vault_options())?;

    match &status {
        OpenStatus::Recovered { backup, cause } => {
            output::warning(&format!("Could not read {}: {cause}", path.display()));
            output::warning(&format!("A copy was kept at {}", backup.display()));
            if access == Access::Write {
                vault.close();
                output::tip("Check the password, or run `credvault repair` to start over.");
                return Err(VaultError::CommandFailed(
                    "refusing to overwrite an unreadable vault".into(),
                ));
            }
            output::tip("Showing an empty vault. Run `credvault repair` to start over.");
        }
        OpenStatus::Loaded { skipped, .. } if !skipped.is_empty() => {
            output::warning(&format!(
                "{} unreadable record line(s) were skipped",
                skipped.len()
            ));
        }
        _ => {}
    }

    Ok(vault)
}

/// Convert a 1-based record number from the command line to an index.
pub fn record_index(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .ok_or_else(|| VaultError::CommandFailed("record numbers start at 1".into()))
}
