//! One module per subcommand, each exposing `execute`.

pub mod add;
pub mod completions;
pub mod generate;
pub mod init;
pub mod list;
pub mod remove;
pub mod repair;
pub mod show;
pub mod update;

use zeroize::Zeroizing;

use crate::cli::{output, SecretArgs};
use crate::errors::{Result, VaultError};
use crate::generator;

/// Resolve the secret for `add`/`update`: `--secret`, `--generate`, or a
/// prompt.  `None` means "keep the current one" and is only possible when
/// `optional` is set and nothing was given.
pub(crate) fn resolve_secret(args: &SecretArgs, optional: bool) -> Result<Option<Zeroizing<String>>> {
    if let Some(secret) = &args.secret {
        return Ok(Some(Zeroizing::new(secret.clone())));
    }
    if args.generate {
        let secret = generator::generate(&args.generator.options())?;
        output::info(&format!(
            "Generated a {}-character secret.",
            secret.chars().count()
        ));
        return Ok(Some(secret));
    }
    if optional {
        return Ok(None);
    }

    let secret = dialoguer::Password::new()
        .with_prompt("Enter secret")
        .with_confirmation("Confirm secret", "Secrets do not match, try again")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("secret prompt: {e}")))?;
    Ok(Some(Zeroizing::new(secret)))
}
