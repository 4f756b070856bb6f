//! Vault module: encrypted credential storage.
//!
//! This module provides:
//! - The `CredentialRecord` type (`record`)
//! - The line-based record text format (`codec`)
//! - Radix-64 vault file format with optional HMAC integrity (`format`)
//! - High-level `Vault` for creating, opening, and managing vaults (`store`)
//! - The boolean `VaultSession` facade (`session`)
//! - `AsyncVault`, which runs vault work on tokio's blocking pool (`worker`)

pub mod codec;
pub mod format;
pub mod record;
pub mod session;
pub mod store;
pub mod worker;

// Re-export the most commonly used items.
pub use codec::{DecodeReport, SkipReason, SkippedLine};
pub use format::VaultFormat;
pub use record::CredentialRecord;
pub use session::VaultSession;
pub use store::{OpenStatus, Vault, VaultOptions, BACKUP_SUFFIX, REPAIR_BACKUP_SUFFIX};
pub use worker::{AsyncVault, VaultTask};
