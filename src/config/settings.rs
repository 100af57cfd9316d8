use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::hasher::{DEFAULT_HASH_SIZE, DEFAULT_ITERATIONS};
use crate::crypto::{KeyManagerOptions, PasswordHasher, SourceType};
use crate::errors::{Result, VaultError};

/// Project-level configuration, loaded from `.credvault.toml`.
///
/// Every field has a sensible default so CredVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to project root) where the user store lives.
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// File name of the encrypted user store inside `store_dir`.
    #[serde(default = "default_store_file")]
    pub store_file: String,

    /// Where key material lives: "environment", "file", or "keyring".
    #[serde(default = "default_key_source_type")]
    pub key_source_type: String,

    /// Variable name, absolute path, or keyring entry for the key.
    #[serde(default = "default_key_source")]
    pub key_source: String,

    /// Variable name, absolute path, or keyring entry for the IV.
    #[serde(default = "default_iv_source")]
    pub iv_source: String,

    /// Override for the per-user environment file (environment sources).
    #[serde(default)]
    pub user_environment_file: Option<PathBuf>,

    /// Password hash and salt length in bytes.
    #[serde(default = "default_hash_size")]
    pub hash_size: usize,

    /// PBKDF2 iteration count.
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_store_dir() -> String {
    ".credvault".to_string()
}

fn default_store_file() -> String {
    "users.vault".to_string()
}

fn default_key_source_type() -> String {
    "environment".to_string()
}

fn default_key_source() -> String {
    "CREDVAULT_KEY".to_string()
}

fn default_iv_source() -> String {
    "CREDVAULT_IV".to_string()
}

fn default_hash_size() -> usize {
    DEFAULT_HASH_SIZE
}

fn default_hash_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            store_file: default_store_file(),
            key_source_type: default_key_source_type(),
            key_source: default_key_source(),
            iv_source: default_iv_source(),
            user_environment_file: None,
            hash_size: default_hash_size(),
            hash_iterations: default_hash_iterations(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".credvault.toml";

    /// Load settings from `<project_dir>/.credvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::Configuration(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Build the full path to the user store.
    ///
    /// Example: `project_dir/.credvault/users.vault`
    pub fn store_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.store_dir).join(&self.store_file)
    }

    /// Key manager options described by these settings.
    pub fn key_manager_options(&self) -> Result<KeyManagerOptions> {
        Ok(KeyManagerOptions {
            source_type: self.key_source_type.parse::<SourceType>()?,
            key_source: self.key_source.clone(),
            iv_source: self.iv_source.clone(),
            user_scope: self.user_environment_file.clone(),
        })
    }

    /// Password hasher with the configured parameters.
    pub fn hasher(&self) -> Result<PasswordHasher> {
        PasswordHasher::with_params(self.hash_size, self.hash_iterations)
    }

    /// The built-in default user's hash only verifies under the default
    /// hashing parameters.
    pub fn supports_default_credentials(&self) -> Result<bool> {
        Ok(self.hasher()? == PasswordHasher::default())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
