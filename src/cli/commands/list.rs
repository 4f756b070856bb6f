//! `credvault list`: display credentials in a table.

use crate::cli::output;
use crate::cli::{open_vault, Access, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, term: Option<&str>, json: bool) -> Result<()> {
    let vault = open_vault(cli, Access::Read)?;
    let matches = vault.search_indexed(term.unwrap_or_default());

    if json {
        return output::print_records_json(&matches);
    }

    let name = vault.current_name().unwrap_or_default();
    match term.map(str::trim).filter(|t| !t.is_empty()) {
        Some(term) => output::info(&format!(
            "{name}: {} of {} credential(s) match '{term}'",
            matches.len(),
            vault.count()
        )),
        None => output::info(&format!("{name}: {} credential(s)", vault.count())),
    }

    output::print_records_table(&matches);
    Ok(())
}
