//! High-level vault operations.
//!
//! `Vault` ties the key derivation, the cipher, the payload format and the
//! record codec to one file path so the rest of the application can work
//! with simple calls like `vault.add_record(record)`.
//!
//! States are `Closed -> Open -> Closed`.  Every mutation is persisted
//! before it returns; if the write fails the in-memory change is rolled
//! back, so memory never runs ahead of the last successful save.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::crypto::cipher::{self, CipherEngine};
use crate::crypto::kdf::{derive_key, derive_stretched_key, generate_salt, Argon2Params};
use crate::crypto::keys::{split_keys, VaultKey};
use crate::errors::{Result, VaultError};

use super::codec::{self, SkippedLine};
use super::format::{self, Envelope, VaultFormat};
use super::record::CredentialRecord;

/// Suffix of the automatic backup made when a vault cannot be read.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Suffix of the backup made by an explicit `repair`.
pub const REPAIR_BACKUP_SUFFIX: &str = ".repair-backup";

/// How new vault files are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VaultOptions {
    pub format: VaultFormat,
    /// Argon2id cost, used by the hardened format only.
    pub argon2: Argon2Params,
}

impl VaultOptions {
    /// A fresh envelope for a new file (new salt for hardened vaults).
    fn new_envelope(&self) -> Envelope {
        match self.format {
            VaultFormat::Legacy => Envelope::Legacy,
            VaultFormat::Hardened => Envelope::Hardened {
                salt: generate_salt(),
                params: self.argon2,
            },
        }
    }
}

/// What a successful `open` found.
#[derive(Debug)]
pub enum OpenStatus {
    /// The file decrypted and decoded into `records` records.  `skipped`
    /// lists the lines the codec dropped.
    Loaded {
        records: usize,
        skipped: Vec<SkippedLine>,
    },
    /// The file was empty or whitespace-only.
    Empty,
    /// The file could not be read.  A copy sits at `backup` and the vault
    /// starts empty; the next save overwrites the unreadable file.
    Recovered { backup: PathBuf, cause: VaultError },
}

impl OpenStatus {
    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Recovered { .. })
    }

    /// Lines the codec dropped (empty unless `Loaded`).
    pub fn skipped(&self) -> &[SkippedLine] {
        match self {
            Self::Loaded { skipped, .. } => skipped,
            _ => &[],
        }
    }
}

/// Keys derived for one envelope.
struct KeyMaterial {
    cipher: VaultKey,
    mac: Option<VaultKey>,
}

/// A successfully read payload, before it is bound to the vault.
struct LoadedPayload {
    envelope: Envelope,
    keys: KeyMaterial,
    records: Vec<CredentialRecord>,
    skipped: Vec<SkippedLine>,
}

/// The open vault session.
///
/// Owns the record list, the key and the file binding.  Create one with
/// `Vault::new`, then `create` or `open` a file.
pub struct Vault {
    /// Bound `.vault` file, `None` while closed.
    path: Option<PathBuf>,

    /// Holds the cipher key (zeroized on clear/drop).
    engine: CipherEngine,

    /// HMAC key, hardened vaults only.
    mac_key: Option<VaultKey>,

    /// Salt and cost the file is sealed with.
    envelope: Envelope,

    /// Records in file order.  Index = identity.
    records: Vec<CredentialRecord>,
}

impl Default for Vault {
    fn default() -> Self {
        Self::new()
    }
}

impl Vault {
    /// A closed vault.
    pub fn new() -> Self {
        Self {
            path: None,
            engine: CipherEngine::new(),
            mac_key: None,
            envelope: Envelope::Legacy,
            records: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create an empty legacy-format vault at `path` and write it.
    pub fn create(&mut self, path: &Path, passphrase: &str) -> Result<()> {
        self.create_with(path, passphrase, &VaultOptions::default())
    }

    /// Create an empty vault at `path` with explicit options and write it.
    ///
    /// An existing file is overwritten; callers confirm that first.  On
    /// failure the vault stays closed.
    pub fn create_with(&mut self, path: &Path, passphrase: &str, options: &VaultOptions) -> Result<()> {
        self.close();

        let envelope = options.new_envelope();
        let keys = derive_keys(passphrase, &envelope)?;
        self.bind(path, envelope, keys, Vec::new());

        if let Err(e) = self.save() {
            self.close();
            return Err(e);
        }

        debug!(path = %path.display(), format = ?envelope.format(), "created vault");
        Ok(())
    }

    /// Open an existing vault file with default options.
    pub fn open(&mut self, path: &Path, passphrase: &str) -> Result<OpenStatus> {
        self.open_with(path, passphrase, &VaultOptions::default())
    }

    /// Open an existing vault file.
    ///
    /// `options` only matter when the file holds no readable payload (empty
    /// file, or Recovery): they decide the format of the next save.
    ///
    /// Unreadable content is not an error: the file is copied to
    /// `<path>.backup` (unless that backup already exists) and the vault
    /// opens empty with `OpenStatus::Recovered`.  If that backup cannot be
    /// written the open fails with `VaultError::Persist`.
    pub fn open_with(&mut self, path: &Path, passphrase: &str, options: &VaultOptions) -> Result<OpenStatus> {
        self.close();

        if !path.exists() {
            return Err(VaultError::NotFound(path.to_path_buf()));
        }

        let raw = fs::read(path)?;
        let text = Zeroizing::new(String::from_utf8_lossy(&raw).into_owned());

        if text.trim().is_empty() {
            let envelope = options.new_envelope();
            let keys = derive_keys(passphrase, &envelope)?;
            self.bind(path, envelope, keys, Vec::new());
            debug!(path = %path.display(), "opened empty vault file");
            return Ok(OpenStatus::Empty);
        }

        let payload = format::sanitize(&text);
        match read_payload(&payload, passphrase) {
            Ok(loaded) => {
                for skip in &loaded.skipped {
                    warn!(
                        path = %path.display(),
                        line = skip.line,
                        reason = %skip.reason,
                        "skipped unreadable record line"
                    );
                }
                self.bind(path, loaded.envelope, loaded.keys, loaded.records);
                debug!(path = %path.display(), records = self.records.len(), "opened vault");
                Ok(OpenStatus::Loaded {
                    records: self.records.len(),
                    skipped: loaded.skipped,
                })
            }
            Err(cause) if cause.is_recoverable() => self.recover(path, passphrase, options, cause),
            Err(e) => Err(e),
        }
    }

    /// Explicit recovery: keep a copy of whatever is at `path` in
    /// `<path>.repair-backup` (replacing an older one), then `create`.
    ///
    /// Returns the backup path when there was a file to copy.
    pub fn repair(&mut self, path: &Path, passphrase: &str) -> Result<Option<PathBuf>> {
        self.repair_with(path, passphrase, &VaultOptions::default())
    }

    pub fn repair_with(
        &mut self,
        path: &Path,
        passphrase: &str,
        options: &VaultOptions,
    ) -> Result<Option<PathBuf>> {
        self.close();

        let backup = if path.exists() {
            let backup = format::sibling_path(path, REPAIR_BACKUP_SUFFIX);
            fs::copy(path, &backup).map_err(|e| VaultError::persist(&backup, e))?;
            warn!(path = %path.display(), backup = %backup.display(), "repairing vault");
            Some(backup)
        } else {
            None
        };

        self.create_with(path, passphrase, options)?;
        Ok(backup)
    }

    /// Wipe the key and records and unbind the file.  Idempotent.
    pub fn close(&mut self) {
        if let Some(path) = self.path.take() {
            debug!(path = %path.display(), "closing vault");
        }
        self.engine.clear_key();
        self.mac_key = None;
        self.envelope = Envelope::Legacy;
        self.records.clear();
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Encrypt the records and write them to the bound file atomically.
    ///
    /// The encoded payload is shape-checked before writing; a payload that
    /// fails is never written (`VaultError::Integrity`).
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| VaultError::State("no vault file is bound".into()))?;
        if !self.engine.has_key() {
            return Err(VaultError::State("no encryption key is set".into()));
        }

        let encoded = codec::encode(&self.records, self.envelope.format());
        let plaintext = Zeroizing::new(encoded);
        let mut blob = self.engine.encrypt(plaintext.as_bytes())?;
        if self.envelope == Envelope::Legacy {
            while format::is_ambiguous_legacy(&blob) {
                blob = self.engine.encrypt(plaintext.as_bytes())?;
            }
        }

        let sealed = format::seal(&self.envelope, self.mac_key.as_ref(), blob)?;
        let text = format::to_text(&sealed);
        format::validate_shape(&text).map_err(|e| {
            VaultError::Integrity(format!("encrypted payload failed self-check: {e}"))
        })?;

        format::write_atomic(path, text.as_bytes())?;
        debug!(path = %path.display(), records = self.records.len(), "saved vault");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// Append a record and save.
    pub fn add_record(&mut self, record: CredentialRecord) -> Result<()> {
        self.require_open()?;
        record.validate()?;

        self.records.push(record);
        if let Err(e) = self.save() {
            self.records.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Replace the record at `index` and save.
    ///
    /// The original `created_at` is kept.
    pub fn update_record(&mut self, index: usize, mut record: CredentialRecord) -> Result<()> {
        self.require_open()?;
        self.check_index(index)?;
        record.validate()?;

        record.created_at = self.records[index].created_at;
        let previous = std::mem::replace(&mut self.records[index], record);
        if let Err(e) = self.save() {
            self.records[index] = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Remove the record at `index`, save, and return it.
    ///
    /// Later records shift down by one.
    pub fn remove_record(&mut self, index: usize) -> Result<CredentialRecord> {
        self.require_open()?;
        self.check_index(index)?;

        let removed = self.records.remove(index);
        if let Err(e) = self.save() {
            self.records.insert(index, removed);
            return Err(e);
        }
        Ok(removed)
    }

    /// Records whose title, username or site contain `term`, ignoring case.
    ///
    /// A blank term matches everything.  File order is preserved.
    pub fn search(&self, term: &str) -> Vec<&CredentialRecord> {
        self.search_indexed(term)
            .into_iter()
            .map(|(_, record)| record)
            .collect()
    }

    /// Like `search`, paired with each record's index.
    pub fn search_indexed(&self, term: &str) -> Vec<(usize, &CredentialRecord)> {
        let term = term.trim().to_lowercase();
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| term.is_empty() || record.matches(&term))
            .collect()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// A vault is open when it has both a file and a key.
    pub fn is_open(&self) -> bool {
        self.path.is_some() && self.engine.has_key()
    }

    /// File name of the bound vault, e.g. `"passwords.vault"`.
    pub fn current_name(&self) -> Option<String> {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Result<&CredentialRecord> {
        self.require_open()?;
        self.check_index(index)?;
        Ok(&self.records[index])
    }

    /// Format the bound file is written in.
    pub fn format(&self) -> Option<VaultFormat> {
        self.is_open().then(|| self.envelope.format())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn bind(
        &mut self,
        path: &Path,
        envelope: Envelope,
        keys: KeyMaterial,
        records: Vec<CredentialRecord>,
    ) {
        self.path = Some(path.to_path_buf());
        self.engine.set_key(keys.cipher);
        self.mac_key = keys.mac;
        self.envelope = envelope;
        self.records = records;
    }

    fn recover(
        &mut self,
        path: &Path,
        passphrase: &str,
        options: &VaultOptions,
        cause: VaultError,
    ) -> Result<OpenStatus> {
        warn!(
            path = %path.display(),
            error = %cause,
            "vault is unreadable, falling back to an empty vault"
        );

        let backup = format::sibling_path(path, BACKUP_SUFFIX);
        if backup.exists() {
            debug!(backup = %backup.display(), "keeping existing backup");
        } else {
            fs::copy(path, &backup).map_err(|e| VaultError::persist(&backup, e))?;
        }

        let envelope = options.new_envelope();
        let keys = derive_keys(passphrase, &envelope)?;
        self.bind(path, envelope, keys, Vec::new());
        Ok(OpenStatus::Recovered { backup, cause })
    }

    fn require_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(VaultError::State("no vault is open".into()))
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(VaultError::Range {
                index,
                len: self.records.len(),
            })
        }
    }
}

/// Derive the keys an envelope needs from the passphrase.
fn derive_keys(passphrase: &str, envelope: &Envelope) -> Result<KeyMaterial> {
    match envelope {
        Envelope::Legacy => Ok(KeyMaterial {
            cipher: derive_key(passphrase),
            mac: None,
        }),
        Envelope::Hardened { salt, params } => {
            let master = derive_stretched_key(passphrase, salt, params)?;
            let split = split_keys(&master)?;
            Ok(KeyMaterial {
                cipher: split.cipher,
                mac: Some(split.mac),
            })
        }
    }
}

/// Shape-check, decode, authenticate, decrypt and parse a sanitized payload.
///
/// Every failure caused by the file's content comes back as a recoverable
/// error (`Format`, `Decryption` or `Integrity`).
fn read_payload(payload: &str, passphrase: &str) -> Result<LoadedPayload> {
    format::validate_shape(payload)?;
    let bytes = format::from_text(payload)?;
    let parsed = format::parse_payload(&bytes)?;

    // Header params come from the file, so a bad cost is a file problem.
    let keys = derive_keys(passphrase, &parsed.envelope).map_err(|e| match e {
        VaultError::KeyDerivation(msg) => VaultError::Format(format!("vault header: {msg}")),
        other => other,
    })?;

    if let (Some(auth), Some(mac_key)) = (&parsed.authenticated, &keys.mac) {
        format::verify_tag(mac_key, auth)?;
    }

    let plaintext = Zeroizing::new(cipher::decrypt(&keys.cipher, parsed.blob)?);
    let text = std::str::from_utf8(&plaintext).map_err(|_| {
        VaultError::Decryption("decrypted payload is not UTF-8 (wrong passphrase?)".into())
    })?;

    let report = codec::decode(text, parsed.envelope.format());
    if report.records.is_empty() && !report.skipped.is_empty() {
        return Err(VaultError::Decryption(format!(
            "none of {} record lines could be decoded (wrong passphrase?)",
            report.skipped.len()
        )));
    }

    Ok(LoadedPayload {
        envelope: parsed.envelope,
        keys,
        records: report.records,
        skipped: report.skipped,
    })
}
