//! Boolean-returning facade over `Vault` for collaborators that only need
//! to know whether an operation worked.
//!
//! Failures are logged with `tracing` and kept in `last_error()` so a UI can
//! still show a message.  A Recovered open counts as success; callers check
//! `last_open_status()` to show the recovery notice.

use std::path::Path;

use tracing::{error, warn};

use crate::errors::VaultError;

use super::record::CredentialRecord;
use super::store::{OpenStatus, Vault, VaultOptions};

/// One vault session with sticky diagnostics.
#[derive(Default)]
pub struct VaultSession {
    vault: Vault,
    options: VaultOptions,
    last_error: Option<VaultError>,
    last_open_status: Option<OpenStatus>,
}

impl VaultSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session whose new vaults are written with `options`.
    pub fn with_options(options: VaultOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn create(&mut self, path: &Path, passphrase: &str) -> bool {
        self.last_open_status = None;
        let result = self.vault.create_with(path, passphrase, &self.options);
        self.record("create", result)
    }

    pub fn open(&mut self, path: &Path, passphrase: &str) -> bool {
        self.last_open_status = None;
        match self.vault.open_with(path, passphrase, &self.options) {
            Ok(status) => {
                if let OpenStatus::Recovered { backup, cause } = &status {
                    warn!(
                        backup = %backup.display(),
                        cause = %cause,
                        "vault opened empty after recovery"
                    );
                }
                self.last_error = None;
                self.last_open_status = Some(status);
                true
            }
            Err(e) => self.fail("open", e),
        }
    }

    pub fn save(&mut self) -> bool {
        let result = self.vault.save();
        self.record("save", result)
    }

    pub fn add_record(&mut self, record: CredentialRecord) -> bool {
        let result = self.vault.add_record(record);
        self.record("add record", result)
    }

    pub fn update_record(&mut self, index: usize, record: CredentialRecord) -> bool {
        let result = self.vault.update_record(index, record);
        self.record("update record", result)
    }

    pub fn remove_record(&mut self, index: usize) -> bool {
        let result = self.vault.remove_record(index).map(drop);
        self.record("remove record", result)
    }

    /// Matching records, cloned out of the session.
    pub fn search(&self, term: &str) -> Vec<CredentialRecord> {
        self.vault.search(term).into_iter().cloned().collect()
    }

    pub fn is_open(&self) -> bool {
        self.vault.is_open()
    }

    pub fn current_name(&self) -> Option<String> {
        self.vault.current_name()
    }

    pub fn count(&self) -> usize {
        self.vault.count()
    }

    pub fn close(&mut self) {
        self.vault.close();
        self.last_open_status = None;
    }

    /// The error behind the most recent `false`, cleared by the next success.
    pub fn last_error(&self) -> Option<&VaultError> {
        self.last_error.as_ref()
    }

    /// What the most recent successful `open` found.
    pub fn last_open_status(&self) -> Option<&OpenStatus> {
        self.last_open_status.as_ref()
    }

    /// The underlying vault, for callers that want `Result`s.
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    fn record(&mut self, op: &str, result: crate::errors::Result<()>) -> bool {
        match result {
            Ok(()) => {
                self.last_error = None;
                true
            }
            Err(e) => self.fail(op, e),
        }
    }

    fn fail(&mut self, op: &str, err: VaultError) -> bool {
        match &err {
            VaultError::Persist { .. } | VaultError::Integrity(_) | VaultError::Io(_) => {
                error!(operation = op, error = %err, "vault operation failed");
            }
            _ => warn!(operation = op, error = %err, "vault operation failed"),
        }
        self.last_error = Some(err);
        false
    }
}
