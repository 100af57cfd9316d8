use uuid::Uuid;

use super::entity::Entity;
use crate::errors::Result;

/// A cache-backed collection of entities of one type.
///
/// The cache is the source of truth for reads.  Every mutation changes
/// the cache, persists the whole collection, and puts the cache back the
/// way it was if persisting fails, so the cache never holds a change
/// that did not reach storage.
///
/// Call `initialize` once before anything else.
pub trait Repository<T: Entity> {
    /// Create the backing store if it is missing, otherwise load it into
    /// the cache.
    fn initialize(&mut self) -> Result<()>;

    /// The cached records, loading them from storage on first access.
    fn cache(&mut self) -> Result<&[T]>;

    /// Replace the cache with a fresh read from storage.
    fn refresh_cache(&mut self) -> Result<()>;

    /// Read every record from storage, bypassing the cache.
    fn get_records(&self) -> Result<Vec<T>>;

    fn add_record(&mut self, record: T) -> Result<()>;

    /// Replace the stored record that has the same id as `record`.
    ///
    /// Fails with `RecordNotFound` before touching storage if no such
    /// record is cached.
    fn update_record(&mut self, record: T) -> Result<()>;

    /// Fails with `RecordNotFound` before touching storage if `id` is not
    /// cached.
    fn remove_record(&mut self, id: Uuid) -> Result<()>;

    fn clear_all_records(&mut self) -> Result<()>;

    /// Remove the backing store and its key material entirely.
    ///
    /// The repository is uninitialized afterwards.
    fn delete_repository(&mut self) -> Result<()>;
}
