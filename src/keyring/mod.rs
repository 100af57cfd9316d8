//! OS keyring backend for key material.
//!
//! Stores the base64-encoded key and IV in the operating system's
//! secure credential store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! Entries are named after the source identifier under a single
//! service name, so `CREDVAULT_KEY` and `CREDVAULT_IV` become two
//! entries of the `credvault` service.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroizing;

use crate::crypto::secret_source::{decode, SecretSource, SourceType};
use crate::errors::{Result, VaultError};

/// Service name used in the OS keyring.
const SERVICE_NAME: &str = "credvault";

/// Secrets held in the OS credential store.
#[derive(Debug, Clone)]
pub struct KeyringSource {
    service: String,
}

impl KeyringSource {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom service name (keeps test entries apart from real ones).
    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, source: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, source).map_err(|e| {
            VaultError::Configuration(format!("failed to create keyring entry: {e}"))
        })
    }
}

impl Default for KeyringSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretSource for KeyringSource {
    fn source_type(&self) -> SourceType {
        SourceType::Keyring
    }

    fn load(&self, source: &str) -> Result<Zeroizing<Vec<u8>>> {
        match self.entry(source)?.get_password() {
            Ok(encoded) => decode(source, &Zeroizing::new(encoded)),
            Err(keyring::Error::NoEntry) => Err(VaultError::SecretLoad {
                source_id: source.to_string(),
                reason: "no keyring entry".into(),
            }),
            Err(e) => Err(VaultError::SecretLoad {
                source_id: source.to_string(),
                reason: format!("failed to read from keyring: {e}"),
            }),
        }
    }

    fn save(&self, source: &str, data: &[u8]) -> Result<()> {
        let encoded = Zeroizing::new(BASE64.encode(data));
        self.entry(source)?
            .set_password(&encoded)
            .map_err(|e| VaultError::SecretSave {
                source_id: source.to_string(),
                reason: format!("failed to store in keyring: {e}"),
            })
    }

    fn delete(&self, source: &str) -> Result<()> {
        match self.entry(source)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(VaultError::SecretSave {
                source_id: source.to_string(),
                reason: format!("failed to delete from keyring: {e}"),
            }),
        }
    }
}
