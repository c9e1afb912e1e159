//! Master key handling.
//!
//! A master key is supplied as URL-safe base64 text encoding 32 bytes.
//! The decoded bytes key the global token cipher; the text itself is
//! the password fed into PBKDF2 for per-user keys.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::kdf::KEY_LEN;
use super::LENIENT_URL_SAFE;
use crate::errors::{Result, TextCryptError};

/// A parsed master key that zeroes its memory when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    text: String,
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Parse a master key from its base64 text form.
    ///
    /// An empty or blank key is `MissingKey`; text that is not base64 or
    /// does not decode to exactly 32 bytes is `InvalidKey`.
    pub fn parse(secret_key: &str) -> Result<Self> {
        if secret_key.trim().is_empty() {
            return Err(TextCryptError::MissingKey);
        }

        let mut decoded = LENIENT_URL_SAFE.decode(secret_key).map_err(|e| {
            TextCryptError::InvalidKey(format!("key must be URL-safe base64: {e}"))
        })?;

        if decoded.len() != KEY_LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(TextCryptError::InvalidKey(format!(
                "key must decode to {KEY_LEN} bytes (got {len})"
            )));
        }

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();

        Ok(Self {
            text: secret_key.to_string(),
            bytes,
        })
    }

    /// The decoded key bytes (for the global token cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// The key text as supplied (the PBKDF2 password).
    pub fn as_text(&self) -> &str {
        &self.text
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// Generate a new random master key as URL-safe base64 text.
pub fn generate_key() -> String {
    let mut key = [0u8; KEY_LEN];
    rand::rng().fill_bytes(&mut key);
    let encoded = URL_SAFE.encode(key);
    key.zeroize();
    encoded
}

// ── Tests ────────────────────────────────────────────────────────────
