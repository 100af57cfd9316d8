//! Where raw key material lives between runs.
//!
//! A `SecretSource` resolves secret bytes (an encryption key or an IV)
//! by a source identifier: an environment variable name, an absolute
//! file path, or an OS keyring entry name.  Values always travel as
//! base64 text; raw bytes are never written verbatim.
//!
//! Backends:
//! - `EnvironmentSource`: process environment plus a per-user env file
//! - `FileSource`: one base64 file per secret
//! - `KeyringSource` (feature `keyring-store`): OS credential store

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use regex::Regex;
use zeroize::Zeroizing;

use super::env_file;
use crate::errors::{Result, VaultError};

/// Kind of place a secret is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Environment,
    File,
    Keyring,
}

impl FromStr for SourceType {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "environment" | "env" => Ok(Self::Environment),
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            other => Err(VaultError::Configuration(format!(
                "unknown secret source type '{other}' (supported: environment, file, keyring)"
            ))),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => f.write_str("environment"),
            Self::File => f.write_str("file"),
            Self::Keyring => f.write_str("keyring"),
        }
    }
}

fn env_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").expect("environment name pattern is valid")
    })
}

/// Resolve a file source identifier to a local path.
///
/// Accepts an absolute path or a `file://` URI.  Returns `None` for
/// anything relative or for non-file URIs.
pub fn file_path_from_source(source: &str) -> Option<PathBuf> {
    let raw = match source.strip_prefix("file://") {
        Some(rest) => rest,
        None if source.contains("://") => return None,
        None => source,
    };

    let path = PathBuf::from(raw);
    path.is_absolute().then_some(path)
}

/// Check a source identifier's syntax for the given source type.
///
/// - Empty or whitespace-only identifiers are always rejected.
/// - Environment variables and keyring entries must match
///   `^[A-Za-z_][A-Za-z0-9_]*$`.
/// - File sources must be absolute paths or `file://` URIs.
pub fn validate_source(source: &str, source_type: SourceType) -> Result<()> {
    if source.trim().is_empty() {
        return Err(VaultError::Configuration(
            "secret source cannot be empty".into(),
        ));
    }

    match source_type {
        SourceType::Environment | SourceType::Keyring => {
            if !env_name_pattern().is_match(source) {
                return Err(VaultError::Configuration(format!(
                    "'{source}' is not a valid name: it must start with a letter or underscore and contain only letters, digits, and underscores"
                )));
            }
        }
        SourceType::File => {
            if file_path_from_source(source).is_none() {
                return Err(VaultError::Configuration(format!(
                    "'{source}' is not an absolute file path or file:// URI"
                )));
            }
        }
    }

    Ok(())
}

/// A store for base64-encoded secret values, addressed by identifier.
pub trait SecretSource {
    /// The kind of identifiers this backend understands.
    fn source_type(&self) -> SourceType;

    /// Check that `source` is a syntactically valid identifier.
    fn validate(&self, source: &str) -> Result<()> {
        validate_source(source, self.source_type())
    }

    /// Load and base64-decode the value stored under `source`.
    fn load(&self, source: &str) -> Result<Zeroizing<Vec<u8>>>;

    /// Base64-encode `data` and store it under `source`, replacing any
    /// previous value.
    fn save(&self, source: &str, data: &[u8]) -> Result<()>;

    /// Remove the value stored under `source`.  Removing a missing value
    /// is not an error.
    fn delete(&self, source: &str) -> Result<()>;
}

/// Build the backend for a source type.
///
/// `user_scope` overrides the per-user environment file used by
/// `EnvironmentSource`; it is ignored by the other backends.
pub fn source_for(
    source_type: SourceType,
    user_scope: Option<PathBuf>,
) -> Result<Box<dyn SecretSource>> {
    match source_type {
        SourceType::Environment => Ok(Box::new(match user_scope {
            Some(path) => EnvironmentSource::with_user_scope(path),
            None => EnvironmentSource::new(),
        })),
        SourceType::File => Ok(Box::new(FileSource)),
        #[cfg(feature = "keyring-store")]
        SourceType::Keyring => Ok(Box::new(crate::keyring::KeyringSource::new())),
        #[cfg(not(feature = "keyring-store"))]
        SourceType::Keyring => Err(VaultError::Configuration(
            "keyring support not compiled; rebuild with `cargo build --features keyring-store`"
                .into(),
        )),
    }
}

pub(crate) fn decode(source: &str, encoded: &str) -> Result<Zeroizing<Vec<u8>>> {
    BASE64
        .decode(encoded.trim())
        .map(Zeroizing::new)
        .map_err(|_| VaultError::SecretLoad {
            source_id: source.to_string(),
            reason: "value is not valid base64".into(),
        })
}

// ---------------------------------------------------------------------------
// Environment variables
// ---------------------------------------------------------------------------

/// Secrets held in environment variables.
///
/// Saving sets the variable in the current process (so child processes
/// spawned afterwards inherit it) and records it in a per-user
/// environment file so later sessions can load it again.  Loading
/// prefers the user file and falls back to the process environment.
///
/// The process environment is global state shared by every thread;
/// writes here are neither isolated nor transactional.
#[derive(Debug, Clone)]
pub struct EnvironmentSource {
    user_scope: Option<PathBuf>,
}

impl EnvironmentSource {
    /// Use the default per-user file at `<config_dir>/credvault/environment`.
    pub fn new() -> Self {
        Self {
            user_scope: dirs::config_dir().map(|d| d.join("credvault").join("environment")),
        }
    }

    /// Use an explicit per-user environment file.
    pub fn with_user_scope(path: impl Into<PathBuf>) -> Self {
        Self {
            user_scope: Some(path.into()),
        }
    }

    /// Only touch the process environment.
    pub fn process_only() -> Self {
        Self { user_scope: None }
    }

    /// Path of the per-user environment file, if any.
    pub fn user_scope_path(&self) -> Option<&Path> {
        self.user_scope.as_deref()
    }
}

impl Default for EnvironmentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretSource for EnvironmentSource {
    fn source_type(&self) -> SourceType {
        SourceType::Environment
    }

    fn load(&self, source: &str) -> Result<Zeroizing<Vec<u8>>> {
        // The user file is authoritative: a variable inherited by this
        // process may predate the last rotation.
        if let Some(path) = &self.user_scope {
            let persisted = env_file::lookup(path, source).map_err(|e| VaultError::SecretLoad {
                source_id: source.to_string(),
                reason: format!("cannot read user environment: {e}"),
            })?;
            if let Some(value) = persisted.filter(|v| !v.is_empty()) {
                return decode(source, &value);
            }
        }

        match std::env::var(source).map(Zeroizing::new) {
            Ok(value) if !value.is_empty() => decode(source, &value),
            _ => Err(VaultError::SecretLoad {
                source_id: source.to_string(),
                reason: "environment variable not found".into(),
            }),
        }
    }

    fn save(&self, source: &str, data: &[u8]) -> Result<()> {
        let encoded = Zeroizing::new(BASE64.encode(data));

        std::env::set_var(source, encoded.as_str());

        if let Some(path) = &self.user_scope {
            env_file::upsert(path, source, Some(&encoded)).map_err(|e| VaultError::SecretSave {
                source_id: source.to_string(),
                reason: format!("cannot write user environment: {e}"),
            })?;
        }

        Ok(())
    }

    fn delete(&self, source: &str) -> Result<()> {
        std::env::remove_var(source);

        if let Some(path) = &self.user_scope {
            env_file::upsert(path, source, None).map_err(|e| VaultError::SecretSave {
                source_id: source.to_string(),
                reason: format!("cannot write user environment: {e}"),
            })?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Secrets held in individual files, one base64 value per file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl FileSource {
    fn path(source: &str) -> Result<PathBuf> {
        file_path_from_source(source).ok_or_else(|| {
            VaultError::Configuration(format!(
                "'{source}' is not an absolute file path or file:// URI"
            ))
        })
    }
}

impl SecretSource for FileSource {
    fn source_type(&self) -> SourceType {
        SourceType::File
    }

    fn load(&self, source: &str) -> Result<Zeroizing<Vec<u8>>> {
        let path = Self::path(source)?;
        let content = fs::read_to_string(&path)
            .map(Zeroizing::new)
            .map_err(|e| VaultError::SecretLoad {
                source_id: source.to_string(),
                reason: e.to_string(),
            })?;

        decode(source, &content)
    }

    fn save(&self, source: &str, data: &[u8]) -> Result<()> {
        let path = Self::path(source)?;
        let to_save_error = |e: std::io::Error| VaultError::SecretSave {
            source_id: source.to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(to_save_error)?;
            }
        }

        let encoded = Zeroizing::new(BASE64.encode(data));
        fs::write(&path, encoded.as_bytes()).map_err(to_save_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
                .map_err(to_save_error)?;
        }

        Ok(())
    }

    fn delete(&self, source: &str) -> Result<()> {
        let path = Self::path(source)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VaultError::SecretSave {
                source_id: source.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn valid_environment_names() {
        assert!(validate_source("CREDVAULT_KEY", SourceType::Environment).is_ok());
        assert!(validate_source("_private", SourceType::Environment).is_ok());
        assert!(validate_source("a1_b2", SourceType::Environment).is_ok());
    }

    #[test]
    fn rejects_bad_environment_names() {
        assert!(validate_source("", SourceType::Environment).is_err());
        assert!(validate_source("   ", SourceType::Environment).is_err());
        assert!(validate_source("1KEY", SourceType::Environment).is_err());
        assert!(validate_source("MY-KEY", SourceType::Environment).is_err());
        assert!(validate_source("MY KEY", SourceType::Environment).is_err());
    }

    #[test]
    fn keyring_names_follow_environment_rules() {
        assert!(validate_source("CREDVAULT_IV", SourceType::Keyring).is_ok());
        assert!(validate_source("bad.name", SourceType::Keyring).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn file_sources_must_be_absolute() {
        assert!(validate_source("/etc/credvault/key", SourceType::File).is_ok());
        assert!(validate_source("file:///etc/credvault/key", SourceType::File).is_ok());
        assert!(validate_source("relative/key", SourceType::File).is_err());
        assert!(validate_source("https://example.com/key", SourceType::File).is_err());
        assert!(validate_source("", SourceType::File).is_err());
    }

    #[test]
    fn validation_errors_are_configuration_errors() {
        let err = validate_source("9lives", SourceType::Environment).unwrap_err();
        assert!(matches!(err, VaultError::Configuration(_)));
    }

    #[test]
    fn parse_source_type() {
        assert_eq!("environment".parse::<SourceType>().unwrap(), SourceType::Environment);
        assert_eq!("ENV".parse::<SourceType>().unwrap(), SourceType::Environment);
        assert_eq!("file".parse::<SourceType>().unwrap(), SourceType::File);
        assert_eq!("keyring".parse::<SourceType>().unwrap(), SourceType::Keyring);
        assert!("registry".parse::<SourceType>().is_err());
    }

    #[test]
    fn environment_save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let source = EnvironmentSource::with_user_scope(dir.path().join("environment"));
        let name = "CREDVAULT_TEST_ENV_ROUNDTRIP";

        source.save(name, &[1, 2, 3, 250]).unwrap();
        assert_eq!(source.load(name).unwrap().as_slice(), &[1, 2, 3, 250]);

        // The process value is base64 text, never raw bytes.
        assert_eq!(std::env::var(name).unwrap(), "AQID+g==");

        source.delete(name).unwrap();
        assert!(source.load(name).is_err());
    }

    #[test]
    fn environment_load_reads_user_scope() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("environment");
        let name = "CREDVAULT_TEST_ENV_USER_SCOPE";

        // Simulate a value persisted by an earlier session.
        env_file::upsert(&path, name, Some("AAEC")).unwrap();
        std::env::remove_var(name);

        let source = EnvironmentSource::with_user_scope(&path);
        assert_eq!(source.load(name).unwrap().as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn user_scope_wins_over_stale_process_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("environment");
        let name = "CREDVAULT_TEST_ENV_STALE";

        // Rotated value in the user file, older export in the process.
        env_file::upsert(&path, name, Some("AgIC")).unwrap();
        std::env::set_var(name, "AQEB");

        let source = EnvironmentSource::with_user_scope(&path);
        assert_eq!(source.load(name).unwrap().as_slice(), &[2, 2, 2]);

        // Without a user-file entry the process value is still used.
        env_file::upsert(&path, name, None).unwrap();
        assert_eq!(source.load(name).unwrap().as_slice(), &[1, 1, 1]);
        std::env::remove_var(name);
    }

    #[test]
    fn environment_missing_variable_is_load_error() {
        let source = EnvironmentSource::process_only();
        let err = source.load("CREDVAULT_TEST_ENV_MISSING").unwrap_err();
        assert!(matches!(err, VaultError::SecretLoad { .. }));
    }

    #[test]
    fn environment_rejects_non_base64_value() {
        let name = "CREDVAULT_TEST_ENV_NOT_BASE64";
        std::env::set_var(name, "%%% not base64 %%%");

        let source = EnvironmentSource::process_only();
        let err = source.load(name).unwrap_err();
        assert!(matches!(err, VaultError::SecretLoad { .. }));
    }

    #[test]
    fn file_save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys").join("key.b64");
        let id = path.to_str().unwrap();

        FileSource.save(id, b"raw key bytes").unwrap();
        assert_eq!(FileSource.load(id).unwrap().as_slice(), b"raw key bytes");

        // Stored as base64 text.
        let on_disk = fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, BASE64.encode(b"raw key bytes"));

        FileSource.delete(id).unwrap();
        assert!(!path.exists());
        FileSource.delete(id).unwrap();
    }

    #[test]
    fn file_missing_is_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.b64");
        let err = FileSource.load(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, VaultError::SecretLoad { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("iv.b64");
        FileSource.save(path.to_str().unwrap(), &[9; 12]).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(not(feature = "keyring-store"))]
    #[test]
    fn keyring_backend_requires_feature() {
        let result = source_for(SourceType::Keyring, None);
        assert!(matches!(result, Err(VaultError::Configuration(_))));
    }
}
