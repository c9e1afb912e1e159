use thiserror::Error;

/// All errors that can occur in textcrypt.
#[derive(Debug, Error)]
pub enum TextCryptError {
    // --- Construction errors ---
    #[error("Encryption key not found — a non-empty key is required")]
    MissingKey,

    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Authentication failed — token is invalid, expired, or was issued under a different key")]
    AuthenticationFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Input errors ---
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for textcrypt results.
pub type Result<T> = std::result::Result<T, TextCryptError>;
