//! `credvault show`: print one credential, secret included.

use crate::cli::output;
use crate::cli::{open_vault, record_index, Access, Cli};
use crate::errors::Result;

/// Execute the `show` command.
pub fn execute(cli: &Cli, number: usize) -> Result<()> {
    let index = record_index(number)?;
    let vault = open_vault(cli, Access::Read)?;
    let record = vault.record(index)?;
    output::print_record(index, record);
    Ok(())
}
