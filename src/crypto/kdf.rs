//! Passphrase-based key derivation.
//!
//! Two schemes are supported:
//!
//! - **Direct** (`derive_key`): SHA-256 of the passphrase.  Deterministic
//!   and unsalted, so the same passphrase always reopens the same legacy
//!   vault.  Key strength equals passphrase strength.
//! - **Stretched** (`derive_stretched_key`): Argon2id over the passphrase
//!   and a per-vault salt stored in the hardened file header.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use super::keys::{VaultKey, KEY_LEN};
use crate::errors::{Result, VaultError};

/// Length of the Argon2id salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Configurable Argon2id parameters.
///
/// These map 1:1 to the fields in `Settings` and are stored in the header
/// of every hardened vault so reopening uses the exact same cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Derive the legacy vault key: SHA-256 over the UTF-8 passphrase.
///
/// The digest length matches the AES-256 key length exactly.
pub fn derive_key(passphrase: &str) -> VaultKey {
    let mut digest: [u8; KEY_LEN] = Sha256::digest(passphrase.as_bytes()).into();
    let key = VaultKey::new(digest);
    digest.zeroize();
    key
}

/// Derive a key with Argon2id from a passphrase and salt.
///
/// The same passphrase + salt + params always produce the same key.
/// Enforces minimum parameters so a tampered header cannot downgrade the
/// work factor to nothing.
pub fn derive_stretched_key(
    passphrase: &str,
    salt: &[u8],
    argon2_params: &Argon2Params,
) -> Result<VaultKey> {
    if argon2_params.memory_kib < MIN_MEMORY_KIB {
        return Err(VaultError::KeyDerivation(format!(
            "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
            argon2_params.memory_kib
        )));
    }
    if argon2_params.iterations < 1 {
        return Err(VaultError::KeyDerivation(
            "Argon2 iterations must be at least 1".into(),
        ));
    }
    if argon2_params.parallelism < 1 {
        return Err(VaultError::KeyDerivation(
            "Argon2 parallelism must be at least 1".into(),
        ));
    }

    let params = Params::new(
        argon2_params.memory_kib,
        argon2_params.iterations,
        argon2_params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| VaultError::KeyDerivation(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut bytes = [0u8; KEY_LEN];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut bytes)
        .map_err(|e| VaultError::KeyDerivation(format!("Argon2id hashing failed: {e}")))?;

    let key = VaultKey::new(bytes);
    bytes.zeroize();
    Ok(key)
}

/// Generate a cryptographically random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
