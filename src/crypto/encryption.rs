//! Symmetric cipher algorithms usable by the encryptor.
//!
//! A `SymmetricCipher` is the "algorithm factory" handed to
//! `KeyIvEncryptor`: it reports the key and IV sizes it needs and
//! transforms whole buffers with a caller-supplied key and IV.
//!
//! The default is AES-256-GCM with a 32-byte key and a 12-byte IV
//! (the GCM nonce).  Output layout is the GCM ciphertext followed by
//! its 16-byte auth tag; the IV is not embedded, it lives with the key.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::errors::{CryptoDirection, Result, VaultError};

/// Size of the AES-256 key in bytes.
const KEY_LEN: usize = 32;

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// A symmetric cipher keyed by a (key, IV) pair.
pub trait SymmetricCipher {
    /// Key length in bytes.
    fn key_len(&self) -> usize;

    /// IV length in bytes.
    fn iv_len(&self) -> usize;

    fn encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// AES-256-GCM authenticated encryption.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256GcmCipher;

impl Aes256GcmCipher {
    fn cipher(key: &[u8], iv: &[u8], direction: CryptoDirection) -> Result<Aes256Gcm> {
        // Nonce::from_slice panics on a wrong length, so check first.
        if iv.len() != NONCE_LEN {
            return Err(VaultError::CryptoOperation(direction));
        }
        Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::CryptoOperation(direction))
    }
}

impl SymmetricCipher for Aes256GcmCipher {
    fn key_len(&self) -> usize {
        KEY_LEN
    }

    fn iv_len(&self) -> usize {
        NONCE_LEN
    }

    fn encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Self::cipher(key, iv, CryptoDirection::Encrypt)?;
        cipher
            .encrypt(Nonce::from_slice(iv), plaintext)
            .map_err(|_| VaultError::CryptoOperation(CryptoDirection::Encrypt))
    }

    fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Self::cipher(key, iv, CryptoDirection::Decrypt)?;
        cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| VaultError::CryptoOperation(CryptoDirection::Decrypt))
    }
}
