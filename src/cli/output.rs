//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;
use serde::Serialize;

use crate::errors::{Result, VaultError};
use crate::vault::CredentialRecord;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Print a table of records (#, Title, Username, Site, Created).
///
/// Numbers are 1-based, matching what `show`/`update`/`remove` accept.
pub fn print_records_table(records: &[(usize, &CredentialRecord)]) {
    if records.is_empty() {
        info("No matching credentials.");
        tip("Run `credvault add --title <TITLE>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Title", "Username", "Site", "Created"]);

    for (index, r) in records {
        table.add_row(vec![
            (index + 1).to_string(),
            r.title.clone(),
            r.username.clone().unwrap_or_default(),
            r.site.clone().unwrap_or_default(),
            timestamp(&r.created_at),
        ]);
    }

    println!("{table}");
}

/// One record in `list --json` output.  Never carries the secret.
#[derive(Debug, Serialize)]
pub struct RecordSummary<'a> {
    pub number: usize,
    pub title: &'a str,
    pub username: Option<&'a str>,
    pub site: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> RecordSummary<'a> {
    pub fn new(index: usize, record: &'a CredentialRecord) -> Self {
        Self {
            number: index + 1,
            title: &record.title,
            username: record.username.as_deref(),
            site: record.site.as_deref(),
            created_at: record.created_at,
        }
    }
}

/// Print records as a pretty JSON array.
pub fn print_records_json(records: &[(usize, &CredentialRecord)]) -> Result<()> {
    let summaries: Vec<RecordSummary<'_>> = records
        .iter()
        .map(|(index, record)| RecordSummary::new(*index, record))
        .collect();
    let json = serde_json::to_string_pretty(&summaries)
        .map_err(|e| VaultError::Serialization(format!("JSON output: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Print every field of one record, secret included.
pub fn print_record(index: usize, record: &CredentialRecord) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec!["#".to_string(), (index + 1).to_string()]);
    table.add_row(vec!["Title".to_string(), record.title.clone()]);
    table.add_row(vec![
        "Username".to_string(),
        record.username.clone().unwrap_or_default(),
    ]);
    table.add_row(vec!["Secret".to_string(), record.secret.clone()]);
    table.add_row(vec![
        "Site".to_string(),
        record.site.clone().unwrap_or_default(),
    ]);
    table.add_row(vec!["Created".to_string(), timestamp(&record.created_at)]);
    println!("{table}");
}
