//! Per-user key derivation using PBKDF2-HMAC-SHA256.
//!
//! The master key text is the PBKDF2 password and the caller's salt
//! makes the derived key unique per user.  The digest and the default
//! iteration count are compatibility constants: changing either makes
//! every previously issued per-user token undecryptable.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use hmac::Hmac;
use log::debug;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{LENIENT_STANDARD, LENIENT_URL_SAFE};
use crate::errors::{Result, TextCryptError};

/// Length of the derived key in bytes (a full Fernet key).
pub const KEY_LEN: usize = 32;

/// Length of salts produced by `generate_salt` (128 bits).
const SALT_LEN: usize = 16;

/// Iteration count used when none is configured.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Lowest iteration count we accept.
pub const MIN_ITERATIONS: u32 = 1_000;

/// PBKDF2 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbkdf2Params {
    /// Number of HMAC-SHA256 rounds (default: 100 000).
    pub iterations: u32,
}

impl Default for Pbkdf2Params {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl Pbkdf2Params {
    /// Reject parameters below the safety floor.
    pub fn validate(&self) -> Result<()> {
        if self.iterations < MIN_ITERATIONS {
            return Err(TextCryptError::KeyDerivationFailed(format!(
                "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {})",
                self.iterations
            )));
        }
        Ok(())
    }
}

/// Derive a 32-byte key from `password` and `salt` with PBKDF2-HMAC-SHA256.
///
/// The same password + salt + params always produce the same key.
/// The returned buffer is zeroed when dropped.
pub fn derive_user_key(
    password: &[u8],
    salt: &[u8],
    params: &Pbkdf2Params,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    params.validate()?;

    debug!(
        "deriving per-user key (iterations={}, salt_len={})",
        params.iterations,
        salt.len()
    );

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, params.iterations, &mut key[..])
        .map_err(|e| TextCryptError::KeyDerivationFailed(format!("PBKDF2 failed: {e}")))?;

    Ok(key)
}

/// Decode a base64 salt.
///
/// Accepts the URL-safe and the standard alphabet, with or without
/// padding.  Anything else is an `InvalidEncoding` error.
pub fn decode_salt(salt_b64: &str) -> Result<Vec<u8>> {
    let trimmed = salt_b64.trim();
    LENIENT_URL_SAFE
        .decode(trimmed)
        .or_else(|_| LENIENT_STANDARD.decode(trimmed))
        .map_err(|e| TextCryptError::InvalidEncoding(format!("salt is not valid base64: {e}")))
}

/// Generate a random 16-byte salt, returned as URL-safe base64.
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    URL_SAFE.encode(salt)
}

/// Encode raw salt bytes the way `decode_salt` expects them.
pub fn encode_salt(salt: &[u8]) -> String {
    STANDARD.encode(salt)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn matches_known_pbkdf2_sha256_vector() {
        let params = Pbkdf2Params { iterations: 4096 };
        let key = derive_user_key(b"password", b"salt", &params).unwrap();
        assert_eq!(
            hex(&key[..]),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn derives_known_per_user_key_from_key_text() {
        let key_text = "cw_0x689RpI-jtRR7oE8h_eQsKImvJapLeSbXpwF4e4=";
        let derived =
            derive_user_key(key_text.as_bytes(), b"salt", &Pbkdf2Params::default()).unwrap();
        assert_eq!(
            URL_SAFE.encode(&derived[..]),
            "VOe9M92o9Wht2CBCKvuQjvJnSq6lDami8cwshfJ5gMo="
        );
    }

    #[test]
    fn empty_salt_decodes_to_nothing() {
        assert!(decode_salt("").unwrap().is_empty());
        let params = Pbkdf2Params { iterations: 1_000 };
        assert!(derive_user_key(b"master", b"", &params).is_ok());
    }

    #[test]
    fn same_inputs_same_key() {
        let params = Pbkdf2Params { iterations: 1_000 };
        let a = derive_user_key(b"master", b"salt-1", &params).unwrap();
        let b = derive_user_key(b"master", b"salt-1", &params).unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn different_salt_different_key() {
        let params = Pbkdf2Params { iterations: 1_000 };
        let a = derive_user_key(b"master", b"salt-1", &params).unwrap();
        let b = derive_user_key(b"master", b"salt-2", &params).unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn rejects_iterations_below_floor() {
        let params = Pbkdf2Params {
            iterations: MIN_ITERATIONS - 1,
        };
        assert!(matches!(
            derive_user_key(b"master", b"salt", &params),
            Err(TextCryptError::KeyDerivationFailed(_))
        ));
    }

    #[test]
    fn default_params_match_compat_constant() {
        assert_eq!(Pbkdf2Params::default().iterations, 100_000);
    }

    #[test]
    fn decode_salt_accepts_both_alphabets() {
        assert_eq!(decode_salt("c2FsdA==").unwrap(), b"salt");
        assert_eq!(decode_salt("c2FsdA").unwrap(), b"salt");
        // 0xfb 0xff encodes to "-_8" URL-safe and "+/8" standard.
        assert_eq!(decode_salt("-_8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_salt("+/8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn decode_salt_rejects_garbage() {
        assert!(matches!(
            decode_salt("not-a-base64!!"),
            Err(TextCryptError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn generated_salt_decodes_to_16_bytes() {
        let salt = generate_salt();
        assert_eq!(decode_salt(&salt).unwrap().len(), SALT_LEN);
        assert_ne!(generate_salt(), salt);
    }

    #[test]
    fn encode_salt_roundtrips() {
        let raw = [1u8, 2, 3, 250, 251, 252];
        assert_eq!(decode_salt(&encode_salt(&raw)).unwrap(), raw);
    }
}
