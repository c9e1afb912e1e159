//! Cryptographic primitives for textcrypt.
//!
//! This module provides:
//! - Fernet authenticated text tokens (`token`)
//! - PBKDF2-HMAC-SHA256 per-user key derivation (`kdf`)
//! - Master key parsing and generation (`keys`)

pub mod kdf;
pub mod keys;
pub mod token;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

pub use kdf::{decode_salt, derive_user_key, encode_salt, generate_salt, Pbkdf2Params};
pub use keys::{generate_key, MasterKey};
pub use token::TokenCipher;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// URL-safe base64 that decodes with or without padding.
pub(crate) const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Standard base64 that decodes with or without padding.
pub(crate) const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
