//! On-disk vault payload format and HMAC integrity verification.
//!
//! A `.vault` file is a single radix-64 (standard alphabet, `=` padding)
//! text blob.  An empty or whitespace-only file is a valid empty vault.
//! The decoded bytes take one of two shapes:
//!
//! ```text
//! legacy:   [IV: 16][ciphertext]
//! hardened: [CVH1: 4][memory_kib: 4 LE][iterations: 4 LE][parallelism: 4 LE]
//!           [salt: 16][IV: 16][ciphertext][HMAC-SHA256: 32]
//! ```
//!
//! - **Legacy** keys come straight from SHA-256 of the passphrase and carry
//!   no tag; a wrong key is only noticed by the padding check or the codec.
//! - **Hardened** vaults store the Argon2id salt and cost in a fixed header
//!   and append an HMAC over every preceding byte, verified before
//!   decryption is attempted.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::crypto::cipher::{BLOCK_LEN, IV_LEN};
use crate::crypto::kdf::{Argon2Params, SALT_LEN};
use crate::crypto::keys::VaultKey;
use crate::errors::{Result, VaultError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every hardened payload.
pub const MAGIC: &[u8; 4] = b"CVH1";

/// Fixed hardened header: magic + three u32 params + salt.
const HEADER_LEN: usize = 4 + 12 + SALT_LEN;

/// Size of the HMAC tag appended to hardened payloads (SHA-256 = 32 bytes).
const TAG_LEN: usize = 32;

/// Upper bounds on header KDF costs (2 GiB, 64 passes, 64 lanes).  A header
/// is read before it is authenticated, so it must not dictate unbounded work.
const MAX_MEMORY_KIB: u32 = 2 * 1024 * 1024;
const MAX_ITERATIONS: u32 = 64;
const MAX_PARALLELISM: u32 = 64;

// ---------------------------------------------------------------------------
// Format selection
// ---------------------------------------------------------------------------

/// Which payload shape new vaults are written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultFormat {
    /// Unsalted SHA-256 key, no tag.  Compatible with older vault files.
    #[default]
    Legacy,
    /// Salted Argon2id key plus an HMAC-SHA256 tag.
    Hardened,
}

/// The per-vault parameters a payload was (or will be) sealed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Legacy,
    Hardened {
        salt: [u8; SALT_LEN],
        params: Argon2Params,
    },
}

impl Envelope {
    pub fn format(&self) -> VaultFormat {
        match self {
            Self::Legacy => VaultFormat::Legacy,
            Self::Hardened { .. } => VaultFormat::Hardened,
        }
    }
}

// ---------------------------------------------------------------------------
// Text layer
// ---------------------------------------------------------------------------

fn is_alphabet(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
}

/// Strip whitespace and every character outside the radix-64 alphabet.
///
/// Deliberately lossy: it absorbs trailing newlines and stray editor
/// bytes.  Must run before `validate_shape`.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|&c| is_alphabet(c)).collect()
}

/// Check that `payload` looks like padded radix-64 text.
pub fn validate_shape(payload: &str) -> Result<()> {
    if payload.is_empty() {
        return Err(VaultError::Format(
            "no radix-64 content left after sanitizing".into(),
        ));
    }
    if let Some(bad) = payload.chars().find(|&c| !is_alphabet(c)) {
        return Err(VaultError::Format(format!(
            "unexpected character {bad:?} in payload"
        )));
    }
    if payload.len() % 4 != 0 {
        return Err(VaultError::Format(format!(
            "payload length {} is not a multiple of 4",
            payload.len()
        )));
    }

    let body = payload.trim_end_matches('=');
    let padding = payload.len() - body.len();
    if padding > 2 || body.contains('=') {
        return Err(VaultError::Format("misplaced '=' padding".into()));
    }
    Ok(())
}

/// Radix-64 encode a sealed payload for writing.
pub fn to_text(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode a sanitized, shape-checked payload.
pub fn from_text(payload: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(payload)
        .map_err(|e| VaultError::Format(format!("radix-64 decode: {e}")))
}

// ---------------------------------------------------------------------------
// Binary layer
// ---------------------------------------------------------------------------

/// Bytes covered by a hardened payload's tag, and the tag itself.
pub struct Authenticated<'a> {
    pub signed: &'a [u8],
    pub tag: &'a [u8],
}

/// A decoded payload split into its parts.
pub struct Payload<'a> {
    pub envelope: Envelope,
    /// The cipher blob (IV || ciphertext).
    pub blob: &'a [u8],
    /// Present for hardened payloads only.
    pub authenticated: Option<Authenticated<'a>>,
}

/// Whether a legacy blob would be mistaken for a hardened payload.
///
/// Only possible when the random IV happens to start with `MAGIC`; the
/// store re-encrypts with a fresh IV in that case.
pub fn is_ambiguous_legacy(blob: &[u8]) -> bool {
    blob.starts_with(MAGIC)
}

/// Split decoded bytes into envelope, blob and tag.
pub fn parse_payload(bytes: &[u8]) -> Result<Payload<'_>> {
    if !bytes.starts_with(MAGIC) {
        return Ok(Payload {
            envelope: Envelope::Legacy,
            blob: bytes,
            authenticated: None,
        });
    }

    let min_size = HEADER_LEN + IV_LEN + BLOCK_LEN + TAG_LEN;
    if bytes.len() < min_size {
        return Err(VaultError::Format(format!(
            "hardened payload is {} bytes, expected at least {min_size}",
            bytes.len()
        )));
    }

    let read_u32 = |at: usize| {
        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes[at..at + 4]);
        u32::from_le_bytes(word)
    };
    let params = Argon2Params {
        memory_kib: read_u32(4),
        iterations: read_u32(8),
        parallelism: read_u32(12),
    };
    if params.memory_kib > MAX_MEMORY_KIB
        || params.iterations > MAX_ITERATIONS
        || params.parallelism > MAX_PARALLELISM
    {
        return Err(VaultError::Format(format!(
            "hardened header asks for excessive KDF cost ({params:?})"
        )));
    }
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&bytes[16..HEADER_LEN]);

    let tag_start = bytes.len() - TAG_LEN;
    Ok(Payload {
        envelope: Envelope::Hardened { salt, params },
        blob: &bytes[HEADER_LEN..tag_start],
        authenticated: Some(Authenticated {
            signed: &bytes[..tag_start],
            tag: &bytes[tag_start..],
        }),
    })
}

/// Wrap a cipher blob for storage.
///
/// Legacy payloads are the blob itself.  Hardened payloads get the header
/// and an HMAC over header + blob, which needs `mac_key`.
pub fn seal(envelope: &Envelope, mac_key: Option<&VaultKey>, blob: Vec<u8>) -> Result<Vec<u8>> {
    let (salt, params) = match envelope {
        Envelope::Legacy => return Ok(blob),
        Envelope::Hardened { salt, params } => (salt, params),
    };
    let mac_key =
        mac_key.ok_or_else(|| VaultError::State("hardened vault has no MAC key".into()))?;

    let mut buf = Vec::with_capacity(HEADER_LEN + blob.len() + TAG_LEN);
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&params.memory_kib.to_le_bytes());
    buf.extend_from_slice(&params.iterations.to_le_bytes());
    buf.extend_from_slice(&params.parallelism.to_le_bytes());
    buf.extend_from_slice(salt);
    buf.extend_from_slice(&blob);

    let tag = compute_tag(mac_key, &buf)?;
    buf.extend_from_slice(&tag);
    Ok(buf)
}

/// Compute HMAC-SHA256 over `data`.
pub fn compute_tag(mac_key: &VaultKey, data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(mac_key.as_bytes())
        .map_err(|e| VaultError::State(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verify a hardened payload's tag in constant time.
pub fn verify_tag(mac_key: &VaultKey, authenticated: &Authenticated<'_>) -> Result<()> {
    let mut mac = Hmac::<Sha256>::new_from_slice(mac_key.as_bytes())
        .map_err(|e| VaultError::State(format!("invalid HMAC key: {e}")))?;
    mac.update(authenticated.signed);
    mac.verify_slice(authenticated.tag).map_err(|_| {
        VaultError::Integrity("HMAC mismatch (wrong passphrase or tampered file)".into())
    })
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Sibling path with `suffix` appended to the full file name
/// (`a.vault` -> `a.vault.backup`).
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Write `contents` to `path` **atomically**.
///
/// The temp file lives in the same directory so the rename stays on one
/// filesystem; a crash mid-write leaves the previous file intact.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = sibling_path(path, ".tmp");
    let tmp_path = tmp_path.with_file_name(format!(
        ".{}",
        tmp_path.file_name().unwrap_or_default().to_string_lossy()
    ));

    if let Err(e) = fs::write(&tmp_path, contents) {
        let _ = fs::remove_file(&tmp_path);
        return Err(VaultError::persist(path, e));
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(VaultError::persist(path, e));
    }
    Ok(())
}
