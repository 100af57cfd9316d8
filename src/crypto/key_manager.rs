//! The active (key, IV) pair used by the encryptor.
//!
//! `KeyManager` composes two secret-source slots into one unit: both
//! halves load together or not at all, and a save that fails half-way
//! puts the previous key back before reporting the error.

use std::path::PathBuf;

use tracing::warn;
use zeroize::Zeroizing;

use super::secret_source::{source_for, SecretSource, SourceType};
use crate::errors::{Result, VaultError};

/// Where the key and IV live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyManagerOptions {
    pub source_type: SourceType,
    /// Environment variable name, absolute file path, or keyring entry.
    pub key_source: String,
    /// Same as `key_source`, for the initialization vector.
    pub iv_source: String,
    /// Per-user environment file (environment sources only).
    pub user_scope: Option<PathBuf>,
}

impl KeyManagerOptions {
    /// Options for an environment-backed pair with the default user scope.
    pub fn environment(key_source: &str, iv_source: &str) -> Self {
        Self {
            source_type: SourceType::Environment,
            key_source: key_source.to_string(),
            iv_source: iv_source.to_string(),
            user_scope: None,
        }
    }

    /// Options for a file-backed pair.
    pub fn file(key_source: &str, iv_source: &str) -> Self {
        Self {
            source_type: SourceType::File,
            key_source: key_source.to_string(),
            iv_source: iv_source.to_string(),
            user_scope: None,
        }
    }
}

/// A key and IV, both wiped on drop.
pub type KeyIvPair = (Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>);

pub struct KeyManager {
    options: KeyManagerOptions,
    backend: Box<dyn SecretSource>,
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl KeyManager {
    /// Create a key manager with the backend matching `options.source_type`.
    ///
    /// Both source identifiers are validated up front.
    pub fn new(options: KeyManagerOptions) -> Result<Self> {
        let backend = source_for(options.source_type, options.user_scope.clone())?;
        Self::with_source(options, backend)
    }

    /// Create a key manager over an explicit backend.
    pub fn with_source(options: KeyManagerOptions, backend: Box<dyn SecretSource>) -> Result<Self> {
        if backend.source_type() != options.source_type {
            return Err(VaultError::Configuration(format!(
                "secret backend handles {} sources, options ask for {}",
                backend.source_type(),
                options.source_type
            )));
        }

        backend.validate(&options.key_source)?;
        backend.validate(&options.iv_source)?;

        if options.key_source == options.iv_source {
            return Err(VaultError::Configuration(
                "key and IV must use different sources".into(),
            ));
        }

        Ok(Self { options, backend })
    }

    pub fn options(&self) -> &KeyManagerOptions {
        &self.options
    }

    /// Load the current key and IV.  Fails if either half is missing.
    pub fn load(&self) -> Result<KeyIvPair> {
        let key = self.backend.load(&self.options.key_source)?;
        let iv = self.backend.load(&self.options.iv_source)?;
        Ok((key, iv))
    }

    /// Replace the stored key and IV.
    ///
    /// If the IV cannot be written after the key was, the previous key is
    /// restored (or removed, if there was none) so the stored pair stays
    /// consistent.
    pub fn save(&self, key: &[u8], iv: &[u8]) -> Result<()> {
        let previous_key = self.backend.load(&self.options.key_source).ok();

        self.backend.save(&self.options.key_source, key)?;

        if let Err(e) = self.backend.save(&self.options.iv_source, iv) {
            let restored = match &previous_key {
                Some(old) => self.backend.save(&self.options.key_source, old),
                None => self.backend.delete(&self.options.key_source),
            };
            if restored.is_err() {
                warn!(
                    key_source = %self.options.key_source,
                    "could not restore previous key after IV save failed"
                );
            }
            return Err(e);
        }

        Ok(())
    }

    /// Remove both halves.  Both removals are attempted; the first error
    /// is returned.
    pub fn delete(&self) -> Result<()> {
        let key_result = self.backend.delete(&self.options.key_source);
        let iv_result = self.backend.delete(&self.options.iv_source);
        key_result.and(iv_result)
    }
}
