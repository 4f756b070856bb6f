use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in credvault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Session state errors ---
    #[error("Vault is not ready: {0}")]
    State(String),

    #[error("Vault not found at {0}")]
    NotFound(PathBuf),

    // --- Payload errors ---
    #[error("Invalid vault format: {0}")]
    Format(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Integrity check failed: {0}")]
    Integrity(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    // --- Record errors ---
    #[error("Record index {index} is out of range (vault holds {len} records)")]
    Range { index: usize, len: usize },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    // --- IO errors ---
    #[error("Could not write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- Generator errors ---
    #[error("Password generator: {0}")]
    Generator(String),

    // --- Background task errors ---
    #[error("Background vault task failed: {0}")]
    TaskFailed(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl VaultError {
    /// Build a `Persist` error for a failed write to `path`.
    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }

    /// Whether `open` converts this error into the Recovery fallback.
    ///
    /// Only payload-level failures qualify; a missing file, an I/O
    /// error while reading, or a bad KDF configuration still surface.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Format(_) | Self::Decryption(_) | Self::Integrity(_)
        )
    }
}

/// Convenience type alias for credvault results.
pub type Result<T> = std::result::Result<T, VaultError>;
