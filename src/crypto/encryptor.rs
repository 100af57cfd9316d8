//! Whole-buffer encryption with a rotating key.
//!
//! Every `encrypt` call generates a brand-new key and IV, encrypts with
//! them, and hands the pair to the `KeyManager`, which replaces whatever
//! pair was stored before.  There is exactly one active pair at a time.
//! Since the store is rewritten in full on every mutation, nothing ever
//! needs the old key again once the new ciphertext is on disk.
//!
//! The pair that was active before the last `encrypt` is held in memory
//! until the next one, so a caller whose write of the new ciphertext
//! fails can put the old pair back with `restore_previous_key`.
//!
//! Failures in either direction surface only as the fixed
//! `CryptoOperation` messages.

use std::cell::RefCell;

use rand::RngCore;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::encryption::{Aes256GcmCipher, SymmetricCipher};
use super::key_manager::{KeyIvPair, KeyManager};
use crate::errors::{CryptoDirection, Result, VaultError};

/// Symmetric encryption of byte buffers with externally managed keys.
pub trait Encryptor {
    /// Encrypt `plaintext`, persisting the fresh key material.
    ///
    /// `plaintext` is overwritten with zeros before returning, whether
    /// or not encryption succeeded.
    fn encrypt(&self, plaintext: &mut [u8]) -> Result<Vec<u8>>;

    /// Decrypt with the currently stored key material.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Remove the stored key material.
    fn delete_key(&self) -> Result<()>;

    /// Undo the key replacement made by the last successful `encrypt`.
    ///
    /// For callers that failed to store the ciphertext and still need
    /// the previous ciphertext to decrypt.
    fn restore_previous_key(&self) -> Result<()> {
        Ok(())
    }
}

/// `Encryptor` over a `KeyManager` and a cipher algorithm.
pub struct KeyIvEncryptor<C = Aes256GcmCipher> {
    key_manager: KeyManager,
    cipher: C,
    /// Pair replaced by the last `encrypt`; `Some(None)` if there was none.
    previous: RefCell<Option<Option<KeyIvPair>>>,
}

impl<C: std::fmt::Debug> std::fmt::Debug for KeyIvEncryptor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyIvEncryptor")
            .field("key_manager", &self.key_manager)
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

impl KeyIvEncryptor<Aes256GcmCipher> {
    /// AES-256-GCM encryptor.
    pub fn aes_gcm(key_manager: KeyManager) -> Self {
        Self::new(key_manager, Aes256GcmCipher)
    }
}

impl<C: SymmetricCipher> KeyIvEncryptor<C> {
    pub fn new(key_manager: KeyManager, cipher: C) -> Self {
        Self {
            key_manager,
            cipher,
            previous: RefCell::new(None),
        }
    }

    pub fn key_manager(&self) -> &KeyManager {
        &self.key_manager
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut rng = rand::rng();

        let mut key = Zeroizing::new(vec![0u8; self.cipher.key_len()]);
        rng.fill_bytes(&mut key[..]);
        let mut iv = Zeroizing::new(vec![0u8; self.cipher.iv_len()]);
        rng.fill_bytes(&mut iv[..]);

        let ciphertext = self.cipher.encrypt(&key, &iv, plaintext)?;

        let previous = self.key_manager.load().ok();
        self.key_manager.save(&key, &iv).map_err(|e| {
            debug!(error = %e, "could not persist fresh key material");
            e
        })?;
        *self.previous.borrow_mut() = Some(previous);

        Ok(ciphertext)
    }

    fn open(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let (key, iv) = self.key_manager.load().map_err(|e| {
            debug!(error = %e, "could not load key material");
            e
        })?;

        self.cipher
            .decrypt(&key, &iv, ciphertext)
            .map(Zeroizing::new)
    }
}

impl<C: SymmetricCipher> Encryptor for KeyIvEncryptor<C> {
    fn encrypt(&self, plaintext: &mut [u8]) -> Result<Vec<u8>> {
        let result = self.seal(plaintext);
        plaintext.zeroize();
        result.map_err(|_| VaultError::CryptoOperation(CryptoDirection::Encrypt))
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.open(ciphertext)
            .map_err(|_| VaultError::CryptoOperation(CryptoDirection::Decrypt))
    }

    fn delete_key(&self) -> Result<()> {
        self.previous.borrow_mut().take();
        self.key_manager.delete()
    }

    fn restore_previous_key(&self) -> Result<()> {
        match self.previous.borrow_mut().take() {
            Some(Some((key, iv))) => self.key_manager.save(&key, &iv),
            Some(None) => self.key_manager.delete(),
            None => Ok(()),
        }
    }
}
