use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Direction of a failed symmetric-cipher operation.
///
/// Only the direction is ever reported; the underlying cipher error is
/// discarded so callers never see algorithm diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoDirection {
    Encrypt,
    Decrypt,
}

impl fmt::Display for CryptoDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encrypt => f.write_str("Encryption failed."),
            Self::Decrypt => f.write_str("Decryption failed."),
        }
    }
}

/// What went wrong underneath a failed repository operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryErrorKind {
    FileNotFound,
    AccessDenied,
    Io,
    MalformedJson,
    Crypto,
    InvalidFormat,
    Unknown,
}

impl RepositoryErrorKind {
    /// Classify an underlying error into a repository failure kind.
    pub fn classify(error: &VaultError) -> Self {
        match error {
            VaultError::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => Self::FileNotFound,
                std::io::ErrorKind::PermissionDenied => Self::AccessDenied,
                _ => Self::Io,
            },
            VaultError::Serialization(_) => Self::MalformedJson,
            VaultError::CryptoOperation(_)
            | VaultError::SecretLoad { .. }
            | VaultError::SecretSave { .. } => Self::Crypto,
            VaultError::InvalidFormat(_) => Self::InvalidFormat,
            _ => Self::Unknown,
        }
    }

    /// Human-readable description, scoped to the backing file where relevant.
    pub fn describe(&self, path: &std::path::Path) -> String {
        let path = path.display();
        match self {
            Self::FileNotFound => format!("The file at {path} was not found."),
            Self::AccessDenied => format!("Access to the file at {path} is denied."),
            Self::Io => format!("An I/O error occurred while accessing the file at {path}."),
            Self::MalformedJson => {
                "An error occurred while serializing or deserializing the data.".to_string()
            }
            Self::Crypto => "An error occurred while encrypting or decrypting the data.".to_string(),
            Self::InvalidFormat => "The data is in an invalid format.".to_string(),
            Self::Unknown => "An unexpected error occurred.".to_string(),
        }
    }
}

/// All errors that can occur in CredVault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Secret source errors ---
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to load secret from '{source_id}': {reason}")]
    SecretLoad { source_id: String, reason: String },

    #[error("Failed to save secret to '{source_id}': {reason}")]
    SecretSave { source_id: String, reason: String },

    // --- Crypto errors ---
    #[error("{0}")]
    CryptoOperation(CryptoDirection),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // --- Persistence errors ---
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Error while attempting to {operation}: {message}")]
    Repository {
        operation: &'static str,
        kind: RepositoryErrorKind,
        message: String,
        #[source]
        source: Box<VaultError>,
    },

    #[error("The record {0} does not exist.")]
    RecordNotFound(Uuid),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- Account errors ---
    #[error("Invalid role name '{0}'")]
    UnknownRole(String),

    #[error("Invalid username: {0}")]
    Username(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),

    #[error("User '{0}' does not exist")]
    UserNotFound(String),

    #[error("No user is currently authenticated.")]
    NoAuthenticatedUser,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Store not found at {0}; run `credvault init` first")]
    StoreNotFound(PathBuf),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl VaultError {
    /// True for repository failures, including the record-not-found case.
    pub fn is_repository_error(&self) -> bool {
        matches!(self, Self::Repository { .. } | Self::RecordNotFound(_))
    }

    /// The failure kind of a repository error, if this is one.
    pub fn repository_kind(&self) -> Option<RepositoryErrorKind> {
        match self {
            Self::Repository { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<base64::DecodeError> for VaultError {
    fn from(e: base64::DecodeError) -> Self {
        Self::InvalidFormat(format!("base64: {e}"))
    }
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_errors_use_fixed_messages() {
        assert_eq!(
            VaultError::CryptoOperation(CryptoDirection::Encrypt).to_string(),
            "Encryption failed."
        );
        assert_eq!(
            VaultError::CryptoOperation(CryptoDirection::Decrypt).to_string(),
            "Decryption failed."
        );
    }

    #[test]
    fn classify_io_errors_by_kind() {
        let not_found = VaultError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        let denied = VaultError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        let other = VaultError::Io(std::io::Error::other("disk on fire"));

        assert_eq!(
            RepositoryErrorKind::classify(&not_found),
            RepositoryErrorKind::FileNotFound
        );
        assert_eq!(
            RepositoryErrorKind::classify(&denied),
            RepositoryErrorKind::AccessDenied
        );
        assert_eq!(RepositoryErrorKind::classify(&other), RepositoryErrorKind::Io);
    }

    #[test]
    fn classify_non_io_errors() {
        assert_eq!(
            RepositoryErrorKind::classify(&VaultError::Serialization("x".into())),
            RepositoryErrorKind::MalformedJson
        );
        assert_eq!(
            RepositoryErrorKind::classify(&VaultError::CryptoOperation(CryptoDirection::Decrypt)),
            RepositoryErrorKind::Crypto
        );
        assert_eq!(
            RepositoryErrorKind::classify(&VaultError::InvalidFormat("x".into())),
            RepositoryErrorKind::InvalidFormat
        );
        assert_eq!(
            RepositoryErrorKind::classify(&VaultError::UserCancelled),
            RepositoryErrorKind::Unknown
        );
    }

    #[test]
    fn record_not_found_counts_as_repository_error() {
        assert!(VaultError::RecordNotFound(Uuid::new_v4()).is_repository_error());
        assert!(!VaultError::NoAuthenticatedUser.is_repository_error());
    }
}
