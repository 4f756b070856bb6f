//! Cryptographic primitives for credvault.
//!
//! This module provides:
//! - AES-256-CBC encryption and decryption (`cipher`)
//! - Passphrase key derivation, direct SHA-256 or Argon2id (`kdf`)
//! - The zeroizing `VaultKey` and HKDF sub-key splitting (`keys`)

pub mod cipher;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use cipher::{decrypt, encrypt, CipherEngine};
pub use kdf::{derive_key, derive_stretched_key, generate_salt, Argon2Params};
pub use keys::{split_keys, VaultKey};
