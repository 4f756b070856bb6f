//! The credential record stored inside a vault.
//!
//! A record is identified only by its position in the vault.  Its contents
//! are wiped from memory when the record is dropped.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Result, VaultError};

/// A single credential entry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialRecord {
    /// Display title (e.g. "Mail").  Required.
    pub title: String,

    /// Login name, if any.
    pub username: Option<String>,

    /// The stored password.  Required.
    pub secret: String,

    /// Website or host the credential belongs to, if any.
    pub site: Option<String>,

    /// When this record was first created (millisecond precision).
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        title: impl Into<String>,
        username: Option<String>,
        secret: impl Into<String>,
        site: Option<String>,
    ) -> Self {
        Self::with_created_at(title, username, secret, site, now_millis())
    }

    /// Create a record with an explicit creation time.
    ///
    /// Empty optional fields are normalized to `None` and the timestamp is
    /// truncated to whole milliseconds, which is what the file stores.
    pub fn with_created_at(
        title: impl Into<String>,
        username: Option<String>,
        secret: impl Into<String>,
        site: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_at.timestamp_millis())
            .unwrap_or(created_at);
        Self {
            title: title.into(),
            username: non_empty(username),
            secret: secret.into(),
            site: non_empty(site),
            created_at,
        }
    }

    /// Check the required fields before a record enters a vault.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(VaultError::InvalidRecord("title cannot be empty".into()));
        }
        if self.secret.is_empty() {
            return Err(VaultError::InvalidRecord("secret cannot be empty".into()));
        }
        Ok(())
    }

    /// Case-insensitive match of an already lowercased `term` against
    /// title, username and site.
    pub(crate) fn matches(&self, term: &str) -> bool {
        let hit = |field: &str| field.to_lowercase().contains(term);
        hit(self.title.as_str())
            || self.username.as_deref().is_some_and(hit)
            || self.site.as_deref().is_some_and(hit)
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("title", &self.title)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("site", &self.site)
            .field("created_at", &self.created_at)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::<Utc>::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
