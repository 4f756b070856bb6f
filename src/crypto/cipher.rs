//! AES-256-CBC encryption with PKCS#7 padding.
//!
//! Each call to `encrypt` generates a fresh random 16-byte IV and prepends
//! it to the ciphertext.  `decrypt` splits the IV back out.
//!
//! Layout of the returned byte buffer:
//!   [ 16-byte IV | ciphertext (multiple of 16 bytes) ]
//!
//! CBC carries no authentication tag.  A wrong key is usually caught by
//! the padding check, but not always; hardened vaults add an HMAC on top
//! (see `vault::format`).

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use super::keys::VaultKey;
use crate::errors::{Result, VaultError};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Size of the CBC initialization vector in bytes.
pub const IV_LEN: usize = 16;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Encrypt `plaintext` with `key`.
///
/// Returns the IV prepended to the ciphertext (IV || ciphertext).
pub fn encrypt(key: &VaultKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    rand::rng().fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| VaultError::State(format!("cipher setup: {e}")))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut output = Vec::with_capacity(IV_LEN + ciphertext.len());
    output.extend_from_slice(&iv);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt a blob that was produced by `encrypt`.
pub fn decrypt(key: &VaultKey, blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < IV_LEN {
        return Err(VaultError::Decryption(format!(
            "blob is {} bytes, shorter than the {IV_LEN}-byte IV",
            blob.len()
        )));
    }

    let (iv, ciphertext) = blob.split_at(IV_LEN);
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(VaultError::Decryption(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_LEN}",
            ciphertext.len()
        )));
    }

    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| VaultError::State(format!("cipher setup: {e}")))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| VaultError::Decryption("invalid padding (wrong key or corrupted data)".into()))
}

/// Stateful wrapper holding the key of the currently open vault.
///
/// Without a key every operation fails with `VaultError::State`, which the
/// store keeps distinct from data errors.
#[derive(Debug, Default)]
pub struct CipherEngine {
    key: Option<VaultKey>,
}

impl CipherEngine {
    /// An engine with no key set.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine ready to use `key`.
    pub fn with_key(key: VaultKey) -> Self {
        Self { key: Some(key) }
    }

    /// Install a key, wiping any previous one.
    pub fn set_key(&mut self, key: VaultKey) {
        self.key = Some(key);
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Wipe the key.  The engine is unusable until `set_key` is called.
    pub fn clear_key(&mut self) {
        // Dropping the key zeroizes it.
        self.key = None;
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        encrypt(self.key()?, plaintext)
    }

    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        decrypt(self.key()?, blob)
    }

    fn key(&self) -> Result<&VaultKey> {
        self.key
            .as_ref()
            .ok_or_else(|| VaultError::State("no encryption key is set".into()))
    }
}
