pub mod config;
pub mod crypto;
pub mod engine;
pub mod errors;
pub mod fake;
pub mod helper;

pub use config::Settings;
pub use crypto::{generate_key, generate_salt, Pbkdf2Params};
pub use engine::SymmetricEncryptionHelper;
pub use errors::{Result, TextCryptError};
pub use fake::{Call, FakeEncryptionHelper, UNKNOWN_TOKEN};
pub use helper::EncryptionHelper;
