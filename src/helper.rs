//! The encryption contract shared by every helper implementation.
//!
//! Consumers depend on `EncryptionHelper` and receive a concrete helper at
//! construction time: `SymmetricEncryptionHelper` in production, or
//! `FakeEncryptionHelper` in tests.

use crate::errors::Result;

/// Symmetric text encryption, globally and per user.
///
/// For every plaintext `p` and salt `s`:
///   `decrypt(encrypt(p)) == p`
///   `decrypt_for_user(encrypt_for_user(p, s), s) == p`
pub trait EncryptionHelper: Send + Sync {
    /// Encrypt `plaintext` under the helper's master key.
    fn encrypt(&self, plaintext: &str) -> Result<String>;

    /// Recover the plaintext of a token produced by `encrypt`.
    fn decrypt(&self, encrypted_text: &str) -> Result<String>;

    /// Encrypt `plaintext` under a key derived from the master key and
    /// the base64-encoded `salt_b64`.
    fn encrypt_for_user(&self, plaintext: &str, salt_b64: &str) -> Result<String>;

    /// Recover the plaintext of a token produced by `encrypt_for_user`
    /// with the same salt.
    fn decrypt_for_user(&self, encrypted_text: &str, salt_b64: &str) -> Result<String>;
}

impl<H: EncryptionHelper + ?Sized> EncryptionHelper for Box<H> {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        (**self).encrypt(plaintext)
    }

    fn decrypt(&self, encrypted_text: &str) -> Result<String> {
        (**self).decrypt(encrypted_text)
    }

    fn encrypt_for_user(&self, plaintext: &str, salt_b64: &str) -> Result<String> {
        (**self).encrypt_for_user(plaintext, salt_b64)
    }

    fn decrypt_for_user(&self, encrypted_text: &str, salt_b64: &str) -> Result<String> {
        (**self).decrypt_for_user(encrypted_text, salt_b64)
    }
}

impl<H: EncryptionHelper + ?Sized> EncryptionHelper for std::sync::Arc<H> {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        (**self).encrypt(plaintext)
    }

    fn decrypt(&self, encrypted_text: &str) -> Result<String> {
        (**self).decrypt(encrypted_text)
    }

    fn encrypt_for_user(&self, plaintext: &str, salt_b64: &str) -> Result<String> {
        (**self).encrypt_for_user(plaintext, salt_b64)
    }

    fn decrypt_for_user(&self, encrypted_text: &str, salt_b64: &str) -> Result<String> {
        (**self).decrypt_for_user(encrypted_text, salt_b64)
    }
}
