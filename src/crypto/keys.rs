//! The in-memory vault key and HKDF-SHA256 sub-key splitting.
//!
//! A `VaultKey` never touches disk.  It is wiped when dropped, so clearing
//! an `Option<VaultKey>` is enough to erase it.
//!
//! Hardened vaults stretch the passphrase once with Argon2id and then split
//! the result into two independent sub-keys:
//! - a **cipher key** for AES-256-CBC
//! - a **MAC key** for the HMAC-SHA256 tag over the file payload

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Result, VaultError};

/// Length of every key in bytes (256 bits, for AES-256 and HMAC-SHA256).
pub const KEY_LEN: usize = 32;

/// HKDF context for the cipher sub-key.
const CIPHER_INFO: &[u8] = b"credvault-cipher";

/// HKDF context for the MAC sub-key.
const MAC_INFO: &[u8] = b"credvault-mac";

/// A 32-byte symmetric key that zeroes its memory when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to build a cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl PartialEq for VaultKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for VaultKey {}

impl fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultKey(<redacted>)")
    }
}

/// The pair of keys a hardened vault works with.
pub struct SplitKeys {
    pub cipher: VaultKey,
    pub mac: VaultKey,
}

/// Split a stretched master key into independent cipher and MAC keys.
pub fn split_keys(master: &VaultKey) -> Result<SplitKeys> {
    Ok(SplitKeys {
        cipher: hkdf_derive(master.as_bytes(), CIPHER_INFO)?,
        mac: hkdf_derive(master.as_bytes(), MAC_INFO)?,
    })
}

/// Run HKDF-SHA256 expand with the given `info`.
///
/// The extract step uses no salt: the input already came out of Argon2id.
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<VaultKey> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| VaultError::KeyDerivation(format!("HKDF expand failed: {e}")))?;

    let key = VaultKey::new(okm);
    okm.zeroize();
    Ok(key)
}
