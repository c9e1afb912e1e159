//! Fernet tokens: AES-128-CBC encrypt-then-MAC with HMAC-SHA256.
//!
//! The 32-byte key is split in two: the first half signs, the second
//! half encrypts.  Each call to `encrypt` stamps the current time and
//! generates a fresh random 16-byte IV.  The HMAC covers everything
//! before it, so version, timestamp, IV and ciphertext are all
//! authenticated.  Tokens are interchangeable with any other Fernet
//! implementation sharing the key.
//!
//! Layout of the decoded token:
//!   [ 0x80 | 8-byte BE timestamp | 16-byte IV | AES-128-CBC ciphertext | 32-byte HMAC ]

use std::fmt;
use std::time::Duration;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use log::debug;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::LENIENT_URL_SAFE;
use crate::errors::{Result, TextCryptError};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Version byte leading every token.
pub const TOKEN_VERSION: u8 = 0x80;

/// When a TTL is enforced, tokens stamped further than this into the
/// future are rejected as well.
pub const MAX_CLOCK_SKEW_SECS: u64 = 60;

const KEY_LEN: usize = 32;
const HALF_KEY_LEN: usize = KEY_LEN / 2;
const TIMESTAMP_LEN: usize = 8;
const HEADER_LEN: usize = 1 + TIMESTAMP_LEN;
const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;
const HMAC_LEN: usize = 32;
const MIN_TOKEN_LEN: usize = HEADER_LEN + IV_LEN + BLOCK_LEN + HMAC_LEN;

/// A Fernet cipher for one 32-byte key.
///
/// Holds no per-call state, so one instance can serve concurrent callers.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct TokenCipher {
    signing_key: [u8; HALF_KEY_LEN],
    encryption_key: [u8; HALF_KEY_LEN],
}

impl TokenCipher {
    /// Build a cipher from a 32-byte key (signing half, then encryption half).
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(TextCryptError::InvalidKey(format!(
                "invalid key length: expected {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }

        let mut signing_key = [0u8; HALF_KEY_LEN];
        let mut encryption_key = [0u8; HALF_KEY_LEN];
        signing_key.copy_from_slice(&key[..HALF_KEY_LEN]);
        encryption_key.copy_from_slice(&key[HALF_KEY_LEN..]);

        Ok(Self {
            signing_key,
            encryption_key,
        })
    }

    /// Encrypt `plaintext` into a token stamped with the current time.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        self.encrypt_at_time(plaintext, unix_now())
    }

    /// Encrypt `plaintext` into a token stamped with `timestamp` (unix seconds).
    pub fn encrypt_at_time(&self, plaintext: &[u8], timestamp: u64) -> Result<String> {
        let mut iv = [0u8; IV_LEN];
        rand::rng().fill_bytes(&mut iv);
        self.seal(plaintext, timestamp, &iv)
    }

    fn seal(&self, plaintext: &[u8], timestamp: u64, iv: &[u8; IV_LEN]) -> Result<String> {
        let ciphertext = Aes128CbcEnc::new_from_slices(&self.encryption_key, iv)
            .map_err(|e| TextCryptError::EncryptionFailed(format!("cipher setup failed: {e}")))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut raw = Vec::with_capacity(HEADER_LEN + IV_LEN + ciphertext.len() + HMAC_LEN);
        raw.push(TOKEN_VERSION);
        raw.extend_from_slice(&timestamp.to_be_bytes());
        raw.extend_from_slice(iv);
        raw.extend_from_slice(&ciphertext);

        let tag = self.mac(&raw)?.finalize().into_bytes();
        raw.extend_from_slice(&tag);
        Ok(URL_SAFE.encode(raw))
    }

    /// Decrypt a token without an age limit.
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>> {
        self.decrypt_at_time(token, None, unix_now())
    }

    /// Decrypt a token, rejecting it if it is older than `ttl`.
    pub fn decrypt_with_ttl(&self, token: &str, ttl: Duration) -> Result<Vec<u8>> {
        self.decrypt_at_time(token, Some(ttl), unix_now())
    }

    /// Decrypt a token as if the current time were `now` (unix seconds).
    pub fn decrypt_at_time(&self, token: &str, ttl: Option<Duration>, now: u64) -> Result<Vec<u8>> {
        let raw = decode_token(token)?;
        let timestamp = read_timestamp(&raw);

        if let Some(ttl) = ttl {
            if timestamp.saturating_add(ttl.as_secs()) < now {
                debug!("token rejected: expired");
                return Err(TextCryptError::AuthenticationFailed);
            }
            if now.saturating_add(MAX_CLOCK_SKEW_SECS) < timestamp {
                debug!("token rejected: timestamp too far in the future");
                return Err(TextCryptError::AuthenticationFailed);
            }
        }

        let body = self.verify(&raw)?;
        let (iv, ciphertext) = body[HEADER_LEN..].split_at(IV_LEN);

        Aes128CbcDec::new_from_slices(&self.encryption_key, iv)
            .map_err(|_| TextCryptError::AuthenticationFailed)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| {
                debug!("token rejected: bad padding");
                TextCryptError::AuthenticationFailed
            })
    }

    /// Return the timestamp a token was stamped with, after verifying its HMAC.
    pub fn extract_timestamp(&self, token: &str) -> Result<u64> {
        let raw = decode_token(token)?;
        self.verify(&raw)?;
        Ok(read_timestamp(&raw))
    }

    /// Check the trailing HMAC and return the signed body.
    fn verify<'a>(&self, raw: &'a [u8]) -> Result<&'a [u8]> {
        let (body, tag) = raw.split_at(raw.len() - HMAC_LEN);
        self.mac(body)?.verify_slice(tag).map_err(|_| {
            debug!("token rejected: HMAC mismatch");
            TextCryptError::AuthenticationFailed
        })?;
        Ok(body)
    }

    fn mac(&self, data: &[u8]) -> Result<HmacSha256> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.signing_key)
            .map_err(|e| TextCryptError::EncryptionFailed(format!("HMAC setup failed: {e}")))?;
        mac.update(data);
        Ok(mac)
    }
}

impl fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}

/// Decode token text and check version and minimum length.
fn decode_token(token: &str) -> Result<Vec<u8>> {
    let raw = LENIENT_URL_SAFE.decode(token.trim()).map_err(|_| {
        debug!("token rejected: not valid base64");
        TextCryptError::AuthenticationFailed
    })?;

    if raw.len() < MIN_TOKEN_LEN {
        debug!("token rejected: truncated");
        return Err(TextCryptError::AuthenticationFailed);
    }
    if raw[0] != TOKEN_VERSION {
        debug!("token rejected: unknown version byte {:#04x}", raw[0]);
        return Err(TextCryptError::AuthenticationFailed);
    }
    Ok(raw)
}

fn read_timestamp(raw: &[u8]) -> u64 {
    let mut ts = [0u8; TIMESTAMP_LEN];
    ts.copy_from_slice(&raw[1..HEADER_LEN]);
    u64::from_be_bytes(ts)
}

/// Current unix time in seconds, clamped at zero.
pub(crate) fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

// ── Tests ────────────────────────────────────────────────────────────
