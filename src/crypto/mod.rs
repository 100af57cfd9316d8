//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - Secret sources that hold raw key material (`secret_source`, `env_file`)
//! - The active key/IV pair (`key_manager`)
//! - AES-256-GCM whole-buffer encryption with key rotation (`encryption`, `encryptor`)
//! - PBKDF2-HMAC-SHA512 password hashing (`hasher`)

pub mod encryption;
pub mod encryptor;
pub mod env_file;
pub mod hasher;
pub mod key_manager;
pub mod secret_source;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{Encryptor, KeyManager, PasswordHasher, ...};
pub use encryption::{Aes256GcmCipher, SymmetricCipher};
pub use encryptor::{Encryptor, KeyIvEncryptor};
pub use hasher::PasswordHasher;
pub use key_manager::{KeyManager, KeyManagerOptions};
pub use secret_source::{source_for, validate_source, EnvironmentSource, FileSource, SecretSource, SourceType};
