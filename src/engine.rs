//! The production `EncryptionHelper`.
//!
//! Global operations use a token cipher keyed directly by the master key.
//! Per-user operations derive a fresh key with PBKDF2 from the master key
//! text and the caller's salt, then use a transient cipher for that key.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;

use crate::config::Settings;
use crate::crypto::kdf::{decode_salt, derive_user_key, Pbkdf2Params};
use crate::crypto::keys::MasterKey;
use crate::crypto::token::TokenCipher;
use crate::errors::{Result, TextCryptError};
use crate::helper::EncryptionHelper;

/// Fernet text encryption with PBKDF2 per-user keys.
pub struct SymmetricEncryptionHelper {
    master_key: MasterKey,
    cipher: TokenCipher,
    kdf_params: Pbkdf2Params,
    token_ttl: Option<Duration>,
}

impl SymmetricEncryptionHelper {
    /// Create a helper from URL-safe base64 key text.
    ///
    /// Fails immediately with `MissingKey` for an empty key and with
    /// `InvalidKey` for text that is not a 32-byte base64 key.
    pub fn new(secret_key: &str) -> Result<Self> {
        Self::with_params(secret_key, Pbkdf2Params::default())
    }

    /// Create a helper with explicit PBKDF2 parameters.
    pub fn with_params(secret_key: &str, kdf_params: Pbkdf2Params) -> Result<Self> {
        kdf_params.validate()?;
        let master_key = MasterKey::parse(secret_key)?;
        let cipher = TokenCipher::new(master_key.as_bytes())?;

        debug!(
            "encryption helper ready (pbkdf2 iterations={})",
            kdf_params.iterations
        );

        Ok(Self {
            master_key,
            cipher,
            kdf_params,
            token_ttl: None,
        })
    }

    /// Create a helper configured from `Settings`.
    ///
    /// A configured `token_ttl_secs` is enforced by `decrypt` and
    /// `decrypt_for_user`.
    pub fn from_settings(secret_key: &str, settings: &Settings) -> Result<Self> {
        let mut helper = Self::with_params(secret_key, settings.pbkdf2_params())?;
        helper.token_ttl = settings.token_ttl();
        Ok(helper)
    }

    /// The PBKDF2 parameters used for per-user keys.
    pub fn kdf_params(&self) -> Pbkdf2Params {
        self.kdf_params
    }

    /// Decrypt a global token, rejecting it if it is older than `ttl`.
    pub fn decrypt_with_ttl(&self, encrypted_text: &str, ttl: Duration) -> Result<String> {
        into_text(self.cipher.decrypt_with_ttl(encrypted_text, ttl)?)
    }

    /// Decrypt a per-user token, rejecting it if it is older than `ttl`.
    pub fn decrypt_for_user_with_ttl(
        &self,
        encrypted_text: &str,
        salt_b64: &str,
        ttl: Duration,
    ) -> Result<String> {
        let cipher = self.user_cipher(salt_b64)?;
        into_text(cipher.decrypt_with_ttl(encrypted_text, ttl)?)
    }

    /// When a global token was issued, after verifying it.
    pub fn extract_timestamp(&self, encrypted_text: &str) -> Result<DateTime<Utc>> {
        let secs = self.cipher.extract_timestamp(encrypted_text)?;
        i64::try_from(secs)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or(TextCryptError::AuthenticationFailed)
    }

    /// Build a transient cipher keyed by PBKDF2(master key text, salt).
    fn user_cipher(&self, salt_b64: &str) -> Result<TokenCipher> {
        let salt = decode_salt(salt_b64)?;
        let password = self.master_key.as_text().as_bytes();
        let derived = derive_user_key(password, &salt, &self.kdf_params)?;
        TokenCipher::new(&derived[..])
    }

    fn open(&self, cipher: &TokenCipher, encrypted_text: &str) -> Result<String> {
        let plaintext = match self.token_ttl {
            Some(ttl) => cipher.decrypt_with_ttl(encrypted_text, ttl)?,
            None => cipher.decrypt(encrypted_text)?,
        };
        into_text(plaintext)
    }
}

impl EncryptionHelper for SymmetricEncryptionHelper {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        self.cipher.encrypt(plaintext.as_bytes())
    }

    fn decrypt(&self, encrypted_text: &str) -> Result<String> {
        self.open(&self.cipher, encrypted_text)
    }

    fn encrypt_for_user(&self, plaintext: &str, salt_b64: &str) -> Result<String> {
        self.user_cipher(salt_b64)?.encrypt(plaintext.as_bytes())
    }

    fn decrypt_for_user(&self, encrypted_text: &str, salt_b64: &str) -> Result<String> {
        let cipher = self.user_cipher(salt_b64)?;
        self.open(&cipher, encrypted_text)
    }
}

impl fmt::Debug for SymmetricEncryptionHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricEncryptionHelper")
            .field("master_key", &self.master_key)
            .field("kdf_params", &self.kdf_params)
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}

/// Authenticated plaintext that is not UTF-8 cannot have come from
/// `encrypt`, so it is treated like any other bad token.
fn into_text(plaintext: Vec<u8>) -> Result<String> {
    String::from_utf8(plaintext).map_err(|_| {
        debug!("token rejected: plaintext is not UTF-8");
        TextCryptError::AuthenticationFailed
    })
}

// ── Tests ────────────────────────────────────────────────────────────
