use std::path::Path;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{Pbkdf2Params, DEFAULT_ITERATIONS};
use crate::errors::{Result, TextCryptError};

/// Helper configuration, loaded from `textcrypt.toml`.
///
/// Every field has a default matching the built-in behaviour, so the
/// file is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// PBKDF2 iteration count for per-user keys (default: 100 000).
    ///
    /// Changing this invalidates every per-user token issued before.
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Maximum token age in seconds enforced on decrypt (default: none).
    #[serde(default)]
    pub token_ttl_secs: Option<u64>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_pbkdf2_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: default_pbkdf2_iterations(),
            token_ttl_secs: None,
        }
    }
}

impl Settings {
    /// Name of the config file we look for.
    const FILE_NAME: &'static str = "textcrypt.toml";

    /// Load settings from `<dir>/textcrypt.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed or holds unsafe
    /// parameters, an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            TextCryptError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.pbkdf2_params().validate().map_err(|e| {
            warn!("rejecting {}: {e}", config_path.display());
            TextCryptError::ConfigError(format!("{}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Convert the PBKDF2 settings into crypto-layer params.
    pub fn pbkdf2_params(&self) -> Pbkdf2Params {
        Pbkdf2Params {
            iterations: self.pbkdf2_iterations,
        }
    }

    /// Token age limit, if one is configured.
    pub fn token_ttl(&self) -> Option<Duration> {
        self.token_ttl_secs.map(Duration::from_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
