//! JSON-backed repository stored as a single encrypted file.
//!
//! File layout: `base64(encrypt(utf8(JSON array of DTOs)))`, nothing
//! else.  The whole collection is rewritten on every mutation; with the
//! rotating-key encryptor this also re-keys the file each time.
//!
//! Writes go to a sibling temp file that is then renamed over the
//! target, so a failed write leaves the previous file intact.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::mapper::Mapper;
use super::repository::Repository;
use super::Entity;
use crate::crypto::Encryptor;
use crate::errors::{RepositoryErrorKind, Result, VaultError};

/// Repository whose records live in one encrypted JSON file.
pub struct JsonRepository<M: Mapper, E> {
    path: PathBuf,
    mapper: M,
    encryptor: E,
    cache: Vec<M::Model>,
    initialized: bool,
}

impl<M, E> JsonRepository<M, E>
where
    M: Mapper,
    E: Encryptor,
{
    /// Create a repository over `path`.  Nothing touches the disk until
    /// `initialize` (or the first cache access).
    pub fn new(path: impl Into<PathBuf>, mapper: M, encryptor: E) -> Self {
        Self {
            path: path.into(),
            mapper,
            encryptor,
            cache: Vec::new(),
            initialized: false,
        }
    }

    /// Path to the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ------------------------------------------------------------------
    // File I/O
    // ------------------------------------------------------------------

    fn read_file(&self) -> Result<Vec<M::Model>> {
        let encoded = fs::read_to_string(&self.path)?;
        let ciphertext = BASE64.decode(encoded.trim())?;
        let plaintext = self.encryptor.decrypt(&ciphertext)?;

        let dtos: Vec<M::Dto> = serde_json::from_slice(&plaintext)?;
        let records = self.mapper.to_models(dtos)?;

        debug!(path = %self.path.display(), records = records.len(), "read store");
        Ok(records)
    }

    fn write_file(&self, records: &[M::Model]) -> Result<()> {
        let dtos = self.mapper.to_dtos(records);
        let mut json = Zeroizing::new(serde_json::to_vec(&dtos)?);
        let ciphertext = self.encryptor.encrypt(&mut json)?;
        let encoded = BASE64.encode(ciphertext);

        if let Err(e) = self.replace_file(encoded.as_bytes()) {
            // The file still holds the old ciphertext; pair it with its key again.
            if let Err(restore) = self.encryptor.restore_previous_key() {
                warn!(error = %restore, "could not restore previous key material");
            }
            return Err(e.into());
        }

        debug!(path = %self.path.display(), records = records.len(), "wrote store");
        Ok(())
    }

    /// Atomic write: temp file in the same directory, then rename.
    fn replace_file(&self, contents: &[u8]) -> std::io::Result<()> {
        fs::write(self.tmp_path(), contents)?;
        if let Err(e) = fs::rename(self.tmp_path(), &self.path) {
            let _ = fs::remove_file(self.tmp_path());
            return Err(e);
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let parent = self.path.parent().unwrap_or(Path::new("."));
        parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ))
    }

    /// Wrap a low-level failure as a repository error for `operation`.
    ///
    /// Validation and not-found errors pass through unchanged.
    fn fail(&self, operation: &'static str, error: VaultError) -> VaultError {
        match error {
            VaultError::Validation(_)
            | VaultError::RecordNotFound(_)
            | VaultError::Repository { .. } => error,
            other => {
                let kind = RepositoryErrorKind::classify(&other);
                VaultError::Repository {
                    operation,
                    kind,
                    message: kind.describe(&self.path),
                    source: Box::new(other),
                }
            }
        }
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if !self.initialized {
            self.refresh_cache()?;
        }
        Ok(())
    }

    fn position(&self, id: Uuid) -> Result<usize> {
        self.cache
            .iter()
            .position(|r| r.id() == id)
            .ok_or(VaultError::RecordNotFound(id))
    }

    /// Apply a cache mutation, persist, and undo it if persisting fails.
    ///
    /// `apply` returns whatever `revert` needs to restore the previous
    /// cache state.
    fn commit<U>(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&mut Vec<M::Model>) -> U,
        revert: impl FnOnce(&mut Vec<M::Model>, U),
    ) -> Result<()> {
        let undo = apply(&mut self.cache);

        if let Err(e) = self.write_file(&self.cache) {
            revert(&mut self.cache, undo);
            warn!(
                path = %self.path.display(),
                operation,
                error = %e,
                "store write failed, cache rolled back"
            );
            return Err(self.fail(operation, e));
        }

        Ok(())
    }
}

impl<M, E> Repository<M::Model> for JsonRepository<M, E>
where
    M: Mapper,
    E: Encryptor,
{
    fn initialize(&mut self) -> Result<()> {
        if self.path.exists() {
            return self.refresh_cache();
        }

        let create = || -> Result<()> {
            if let Some(dir) = self.path.parent() {
                if !dir.as_os_str().is_empty() && !dir.exists() {
                    fs::create_dir_all(dir)?;
                }
            }
            self.write_file(&[])
        };
        create().map_err(|e| self.fail("initialize repository", e))?;

        info!(path = %self.path.display(), "created empty store");
        self.cache.clear();
        self.initialized = true;
        Ok(())
    }

    fn cache(&mut self) -> Result<&[M::Model]> {
        self.ensure_loaded()?;
        Ok(&self.cache)
    }

    fn refresh_cache(&mut self) -> Result<()> {
        self.cache = self.get_records()?;
        self.initialized = true;
        Ok(())
    }

    fn get_records(&self) -> Result<Vec<M::Model>> {
        self.read_file().map_err(|e| self.fail("get records", e))
    }

    fn add_record(&mut self, record: M::Model) -> Result<()> {
        self.ensure_loaded()?;
        self.commit(
            "add record",
            |cache| cache.push(record),
            |cache, ()| {
                cache.pop();
            },
        )
    }

    fn update_record(&mut self, record: M::Model) -> Result<()> {
        self.ensure_loaded()?;
        let index = self.position(record.id())?;
        self.commit(
            "update record",
            |cache| std::mem::replace(&mut cache[index], record),
            |cache, old| cache[index] = old,
        )
    }

    fn remove_record(&mut self, id: Uuid) -> Result<()> {
        self.ensure_loaded()?;
        let index = self.position(id)?;
        self.commit(
            "remove record",
            |cache| cache.remove(index),
            |cache, removed| cache.insert(index, removed),
        )
    }

    fn clear_all_records(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        self.commit(
            "clear all records",
            std::mem::take,
            |cache, old| *cache = old,
        )
    }

    fn delete_repository(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.fail("delete repository", e.into())),
        }
        self.encryptor
            .delete_key()
            .map_err(|e| self.fail("delete repository", e))?;

        info!(path = %self.path.display(), "deleted store and key material");
        self.cache.clear();
        self.initialized = false;
        Ok(())
    }
}
