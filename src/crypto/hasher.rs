//! Salted password hashing with PBKDF2-HMAC-SHA512.
//!
//! Hash and salt are the same length (64 bytes by default) and are
//! stored as uppercase hex.  Verification re-derives with the stored
//! salt and compares in constant time.  The caller's password buffer
//! is zeroed on every path out of `generate_hash` and `validate`.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{Result, VaultError};

/// Default hash and salt length in bytes.
pub const DEFAULT_HASH_SIZE: usize = 64;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 350_000;

/// PBKDF2-HMAC-SHA512 password hasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    hash_size: usize,
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            hash_size: DEFAULT_HASH_SIZE,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl PasswordHasher {
    /// Create a hasher with explicit parameters.
    ///
    /// Both the size and the iteration count must be non-zero.
    pub fn with_params(hash_size: usize, iterations: u32) -> Result<Self> {
        if hash_size == 0 {
            return Err(VaultError::InvalidArgument(
                "hash size must be at least 1 byte".into(),
            ));
        }
        if iterations == 0 {
            return Err(VaultError::InvalidArgument(
                "iteration count must be at least 1".into(),
            ));
        }
        Ok(Self {
            hash_size,
            iterations,
        })
    }

    pub fn hash_size(&self) -> usize {
        self.hash_size
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash `password` with a fresh random salt.
    ///
    /// Returns `(hash, salt)` as uppercase hex strings.
    pub fn generate_hash(&self, password: &mut [u8]) -> Result<(String, String)> {
        if password.is_empty() {
            return Err(VaultError::InvalidArgument(
                "password cannot be empty".into(),
            ));
        }

        let mut salt = vec![0u8; self.hash_size];
        rand::rng().fill_bytes(&mut salt);

        let hash = self.derive(password, &salt);
        password.zeroize();

        Ok((hex::encode_upper(&*hash), hex::encode_upper(&salt)))
    }

    /// Check `password` against a stored hash and salt.
    ///
    /// Empty inputs are precondition violations and return
    /// `InvalidArgument`; anything else that does not match, malformed
    /// hex included, is `Ok(false)`.
    pub fn validate(&self, password: &mut [u8], hash: &str, salt: &str) -> Result<bool> {
        let outcome = self.check(password, hash, salt);
        password.zeroize();
        outcome
    }

    fn check(&self, password: &[u8], hash: &str, salt: &str) -> Result<bool> {
        if password.is_empty() {
            return Err(VaultError::InvalidArgument(
                "password cannot be empty".into(),
            ));
        }
        if hash.trim().is_empty() {
            return Err(VaultError::InvalidArgument("hash cannot be empty".into()));
        }
        if salt.trim().is_empty() {
            return Err(VaultError::InvalidArgument("salt cannot be empty".into()));
        }

        let (Ok(expected), Ok(salt_bytes)) = (hex::decode(hash), hex::decode(salt)) else {
            return Ok(false);
        };

        let derived = self.derive(password, &salt_bytes);

        // Slice ct_eq is false on length mismatch without early exit on content.
        Ok(derived.as_slice().ct_eq(&expected).into())
    }

    fn derive(&self, password: &[u8], salt: &[u8]) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(vec![0u8; self.hash_size]);
        pbkdf2_hmac::<Sha512>(password, salt, self.iterations, &mut out);
        out
    }
}
