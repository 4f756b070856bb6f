//! Flat text encoding of the record list.
//!
//! One record per line:
//!
//! ```text
//! title|username|secret|site|createdAtEpochMillis\n
//! ```
//!
//! Fields are escaped before joining so that splitting on unescaped pipes
//! is safe.  The escaping depends on the vault format:
//!
//! * Legacy: `|` -> `\|` and line feed -> `\n`, nothing else.  Backslashes
//!   are stored as-is, which keeps files interchangeable with older
//!   vaults.  A value that itself contains `\|` or `\n`, or ends in a
//!   backslash, does not survive a round trip.
//! * Hardened: additionally `\` -> `\\` and carriage return -> `\r`, so
//!   every string round-trips.
//!
//! Absent optional fields are written as empty strings.
//!
//! Decoding is best-effort: a line that cannot be parsed is skipped and
//! reported in `DecodeReport::skipped` instead of failing the whole text.

use std::fmt;

use chrono::{DateTime, Utc};

use super::format::VaultFormat;
use super::record::CredentialRecord;

/// Number of fields in a well-formed line.
const FIELD_COUNT: usize = 5;

/// Field separator.
const SEPARATOR: char = '|';

/// Why a line was dropped during decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The line split into fewer than five fields.
    TooFewFields { found: usize },
    /// The timestamp field is not an integer or is out of range.
    BadTimestamp(String),
    /// The fields parsed but a required one is empty.
    InvalidRecord(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewFields { found } => {
                write!(f, "expected {FIELD_COUNT} fields, found {found}")
            }
            Self::BadTimestamp(raw) => write!(f, "invalid timestamp '{raw}'"),
            Self::InvalidRecord(msg) => write!(f, "invalid record: {msg}"),
        }
    }
}

/// A line the decoder dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the decrypted text.
    pub line: usize,
    pub reason: SkipReason,
}

/// Result of decoding: the records that parsed plus what was dropped.
#[derive(Debug, Default)]
pub struct DecodeReport {
    pub records: Vec<CredentialRecord>,
    pub skipped: Vec<SkippedLine>,
}

/// Serialize records, one line each, in order.
pub fn encode(records: &[CredentialRecord], format: VaultFormat) -> String {
    let mut out = String::new();
    for record in records {
        let fields = [
            escape(&record.title, format),
            escape(record.username.as_deref().unwrap_or_default(), format),
            escape(&record.secret, format),
            escape(record.site.as_deref().unwrap_or_default(), format),
            record.created_at.timestamp_millis().to_string(),
        ];
        out.push_str(&fields.join("|"));
        out.push('\n');
    }
    out
}

/// Parse text produced by `encode` with the same format, skipping lines
/// that do not parse.
///
/// Empty or whitespace-only input yields an empty report.
pub fn decode(text: &str, format: VaultFormat) -> DecodeReport {
    let mut report = DecodeReport::default();

    for (idx, raw_line) in text.split('\n').enumerate() {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(line, format) {
            Ok(record) => report.records.push(record),
            Err(reason) => report.skipped.push(SkippedLine {
                line: idx + 1,
                reason,
            }),
        }
    }

    report
}

fn parse_line(
    line: &str,
    format: VaultFormat,
) -> std::result::Result<CredentialRecord, SkipReason> {
    let fields = split_unescaped(line, format);
    if fields.len() < FIELD_COUNT {
        return Err(SkipReason::TooFewFields {
            found: fields.len(),
        });
    }

    let raw_ts = fields[4].trim();
    let created_at = raw_ts
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| SkipReason::BadTimestamp(raw_ts.to_string()))?;

    let record = CredentialRecord::with_created_at(
        unescape(&fields[0], format),
        Some(unescape(&fields[1], format)),
        unescape(&fields[2], format),
        Some(unescape(&fields[3], format)),
        created_at,
    );
    record
        .validate()
        .map_err(|e| SkipReason::InvalidRecord(e.to_string()))?;
    Ok(record)
}

/// Escape a single field value.
fn escape(value: &str, format: VaultFormat) -> String {
    let full = format == VaultFormat::Hardened;
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            SEPARATOR => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            '\\' if full => out.push_str("\\\\"),
            '\r' if full => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Reverse `escape`.  Any other backslash sequence is kept verbatim.
fn unescape(value: &str, format: VaultFormat) -> String {
    let full = format == VaultFormat::Hardened;
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.peek().copied() {
            Some(SEPARATOR) => Some(SEPARATOR),
            Some('n') => Some('\n'),
            Some('\\') if full => Some('\\'),
            Some('r') if full => Some('\r'),
            _ => None,
        };
        match decoded {
            Some(d) => {
                chars.next();
                out.push(d);
            }
            // Legacy keeps the next character for its own turn, so a
            // literal backslash may precede an escape.
            None if !full => out.push('\\'),
            None => {
                out.push('\\');
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
        }
    }
    out
}

/// Split on separators that are not escaped.  The returned fields are
/// still escaped.
fn split_unescaped(line: &str, format: VaultFormat) -> Vec<String> {
    let full = format == VaultFormat::Hardened;
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                // Legacy only pairs a backslash with the pipe after it.
                if full || chars.peek() == Some(&SEPARATOR) {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
            }
            SEPARATOR => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
}
