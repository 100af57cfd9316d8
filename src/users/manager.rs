//! Account lifecycle on top of a user repository.
//!
//! `UserManager` owns the one rule the repository cannot check record by
//! record: the store holds exactly one default administrator.
//! `initialize` establishes it and every other operation preserves it.

use std::path::PathBuf;

use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroize;

use super::dto::UserMapper;
use super::role::Role;
use super::user::User;
use crate::crypto::{KeyIvEncryptor, KeyManager, PasswordHasher};
use crate::errors::{Result, VaultError};
use crate::store::{JsonRepository, Repository};

/// The encrypted JSON repository used for accounts.
pub type UserRepository = JsonRepository<UserMapper, KeyIvEncryptor>;

pub struct UserManager<R = UserRepository> {
    repo: R,
    hasher: PasswordHasher,
}

impl UserManager<UserRepository> {
    /// Manager over the encrypted user store at `path`, keyed by
    /// `key_manager`.  Call `initialize` before anything else.
    pub fn open(path: impl Into<PathBuf>, key_manager: KeyManager, hasher: PasswordHasher) -> Self {
        let repo = JsonRepository::new(path, UserMapper, KeyIvEncryptor::aes_gcm(key_manager));
        Self::new(repo, hasher)
    }
}

impl<R: Repository<User>> UserManager<R> {
    pub fn new(repo: R, hasher: PasswordHasher) -> Self {
        Self { repo, hasher }
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Open or create the store, then make sure exactly one default
    /// administrator exists.
    ///
    /// - none: a fresh default user is created and persisted
    /// - one without the Admin role: it is repaired in place
    /// - more than one: the store is corrupt and `InvalidOperation` is returned
    pub fn initialize(&mut self) -> Result<()> {
        self.repo.initialize()?;
        self.ensure_default_user()
    }

    fn ensure_default_user(&mut self) -> Result<()> {
        let defaults: Vec<User> = self
            .repo
            .cache()?
            .iter()
            .filter(|u| u.is_default())
            .cloned()
            .collect();

        match defaults.as_slice() {
            [] => {
                self.repo.add_record(User::default_user())?;
                info!("created default user");
            }
            [default] => {
                if !default.has_role(Role::Admin) {
                    self.repo.update_record(default.with_role(Role::Admin))?;
                    warn!("default user had lost the Admin role; restored it");
                }
            }
            many => {
                let names: Vec<&str> = many.iter().map(User::username).collect();
                return Err(VaultError::InvalidOperation(format!(
                    "multiple default users exist: {}",
                    names.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Hash `password` and store a new `User`-role account.
    ///
    /// The duplicate-name check runs before hashing.  `password` is
    /// zeroed on every path.
    pub fn add_user(&mut self, username: &str, password: &mut [u8]) -> Result<User> {
        let result = self.create_user(username, password);
        password.zeroize();
        result
    }

    fn create_user(&mut self, username: &str, password: &mut [u8]) -> Result<User> {
        if self.find_by_username(username)?.is_some() {
            return Err(VaultError::UserAlreadyExists(username.to_string()));
        }

        let (hash, salt) = self.hasher.generate_hash(password)?;
        let user = User::new(username, &hash, &salt)?;
        self.repo.add_record(user.clone())?;

        info!(username, "added user");
        Ok(user)
    }

    /// All accounts, read from storage rather than the cache.
    pub fn get_users(&self) -> Result<Vec<User>> {
        self.repo.get_records()
    }

    /// All cached accounts.
    pub fn cached_users(&mut self) -> Result<&[User]> {
        self.repo.cache()
    }

    fn find_by_username(&mut self, username: &str) -> Result<Option<&User>> {
        Ok(self.repo.cache()?.iter().find(|u| u.username() == username))
    }

    /// Exact, case-sensitive lookup in the cache.
    pub fn get_user_by_username(&mut self, username: &str) -> Result<Option<User>> {
        Ok(self.find_by_username(username)?.cloned())
    }

    pub fn get_user_by_id(&mut self, id: Uuid) -> Result<Option<User>> {
        Ok(self.repo.cache()?.iter().find(|u| u.id() == id).cloned())
    }

    fn ensure_known(&mut self, user: &User) -> Result<()> {
        if self.repo.cache()?.contains(user) {
            Ok(())
        } else {
            Err(VaultError::UserNotFound(user.username().to_string()))
        }
    }

    /// Remove the account with `user`'s id.
    pub fn remove_user(&mut self, user: &User) -> Result<()> {
        self.ensure_known(user)?;
        self.repo.remove_record(user.id())?;
        info!(username = user.username(), "removed user");
        Ok(())
    }

    pub fn remove_user_by_username(&mut self, username: &str) -> Result<()> {
        let user = self
            .get_user_by_username(username)?
            .ok_or_else(|| VaultError::UserNotFound(username.to_string()))?;
        self.remove_user(&user)
    }

    /// Replace the stored account that has `user`'s id.
    pub fn update_user(&mut self, user: User) -> Result<()> {
        self.ensure_known(&user)?;
        debug!(username = user.username(), "updating user");
        self.repo.update_record(user)
    }

    /// Drop every account and start over with a fresh default user.
    pub fn reset_to_default(&mut self) -> Result<()> {
        self.repo.clear_all_records()?;
        self.repo.add_record(User::default_user())?;
        info!("reset user store to the default user");
        Ok(())
    }

    /// Remove the backing store and its key material.
    pub fn delete_repository(&mut self) -> Result<()> {
        self.repo.delete_repository()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::users::DEFAULT_USERNAME;

    /// In-memory repository with a switch that makes every write fail.
    #[derive(Default)]
    pub(crate) struct MemoryRepository {
        pub stored: Vec<User>,
        pub cache: Vec<User>,
        pub initialized: bool,
        pub fail_writes: bool,
    }

    impl MemoryRepository {
        pub fn with_records(records: Vec<User>) -> Self {
            Self {
                stored: records,
                ..Self::default()
            }
        }

        fn persist(&mut self, previous: Vec<User>) -> Result<()> {
            if self.fail_writes {
                self.cache = previous;
                return Err(VaultError::Io(std::io::Error::other("simulated write failure")));
            }
            self.stored = self.cache.clone();
            Ok(())
        }
    }

    impl Repository<User> for MemoryRepository {
        fn initialize(&mut self) -> Result<()> {
            self.refresh_cache()
        }

        fn cache(&mut self) -> Result<&[User]> {
            if !self.initialized {
                self.refresh_cache()?;
            }
            Ok(&self.cache)
        }

        fn refresh_cache(&mut self) -> Result<()> {
            self.cache = self.stored.clone();
            self.initialized = true;
            Ok(())
        }

        fn get_records(&self) -> Result<Vec<User>> {
            Ok(self.stored.clone())
        }

        fn add_record(&mut self, record: User) -> Result<()> {
            let previous = self.cache.clone();
            self.cache.push(record);
            self.persist(previous)
        }

        fn update_record(&mut self, record: User) -> Result<()> {
            let index = self
                .cache
                .iter()
                .position(|u| u.id() == record.id())
                .ok_or(VaultError::RecordNotFound(record.id()))?;
            let previous = self.cache.clone();
            self.cache[index] = record;
            self.persist(previous)
        }

        fn remove_record(&mut self, id: Uuid) -> Result<()> {
            let index = self
                .cache
                .iter()
                .position(|u| u.id() == id)
                .ok_or(VaultError::RecordNotFound(id))?;
            let previous = self.cache.clone();
            self.cache.remove(index);
            self.persist(previous)
        }

        fn clear_all_records(&mut self) -> Result<()> {
            let previous = std::mem::take(&mut self.cache);
            self.persist(previous)
        }

        fn delete_repository(&mut self) -> Result<()> {
            self.stored.clear();
            self.cache.clear();
            self.initialized = false;
            Ok(())
        }
    }

    pub(crate) fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_params(32, 1_000).unwrap()
    }

    fn manager(records: Vec<User>) -> UserManager<MemoryRepository> {
        UserManager::new(MemoryRepository::with_records(records), fast_hasher())
    }

    fn defaults(m: &mut UserManager<MemoryRepository>) -> Vec<User> {
        m.cached_users()
            .unwrap()
            .iter()
            .filter(|u| u.is_default())
            .cloned()
            .collect()
    }

    #[test]
    fn initialize_empty_store_creates_default_admin() {
        let mut m = manager(vec![]);
        m.initialize().unwrap();

        let d = defaults(&mut m);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].username(), DEFAULT_USERNAME);
        assert_eq!(d[0].role(), Role::Admin);
        assert_eq!(m.get_users().unwrap().len(), 1);
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut m = manager(vec![]);
        m.initialize().unwrap();
        m.initialize().unwrap();
        assert_eq!(m.get_users().unwrap().len(), 1);
    }

    #[test]
    fn initialize_rejects_two_default_users() {
        let mut m = manager(vec![User::default_user(), User::default_user()]);
        let err = m.initialize().unwrap_err();
        assert!(matches!(err, VaultError::InvalidOperation(msg) if msg.contains("multiple default users")));
    }

    #[test]
    fn initialize_repairs_default_user_role() {
        let broken = User::default_user().with_role(Role::User);
        let mut m = manager(vec![broken.clone()]);
        m.initialize().unwrap();

        let stored = m.get_users().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], broken);
        assert_eq!(stored[0].role(), Role::Admin);
    }

    #[test]
    fn add_user_hashes_and_stores() {
        let mut m = manager(vec![]);
        m.initialize().unwrap();

        let mut pw = b"Str0ng!Pass".to_vec();
        let user = m.add_user("validUser1", &mut pw).unwrap();
        assert!(pw.iter().all(|b| *b == 0));
        assert_eq!(user.role(), Role::User);

        let mut check = b"Str0ng!Pass".to_vec();
        assert!(m
            .hasher()
            .validate(&mut check, user.password_hash(), user.salt())
            .unwrap());
        assert_eq!(m.get_user_by_username("validUser1").unwrap(), Some(user));
    }

    #[test]
    fn duplicate_username_rejected_without_changing_cache() {
        let mut m = manager(vec![]);
        m.initialize().unwrap();
        m.add_user("aliceSmith", &mut b"Str0ng!Pass".to_vec()).unwrap();
        let before = m.cached_users().unwrap().len();

        let mut pw = b"Other#Pass9".to_vec();
        let err = m.add_user("aliceSmith", &mut pw).unwrap_err();
        assert!(matches!(err, VaultError::UserAlreadyExists(name) if name == "aliceSmith"));
        assert!(pw.iter().all(|b| *b == 0));
        assert_eq!(m.cached_users().unwrap().len(), before);
    }

    #[test]
    fn username_lookup_is_case_sensitive() {
        let mut m = manager(vec![]);
        m.initialize().unwrap();
        m.add_user("aliceSmith", &mut b"Str0ng!Pass".to_vec()).unwrap();
        assert!(m.get_user_by_username("alicesmith").unwrap().is_none());
    }

    #[test]
    fn update_and_remove_unknown_user_fail() {
        let mut m = manager(vec![]);
        m.initialize().unwrap();
        let stranger = User::new("strangerX", "AB", "CD").unwrap();

        assert!(matches!(
            m.update_user(stranger.clone()),
            Err(VaultError::UserNotFound(_))
        ));
        assert!(matches!(
            m.remove_user(&stranger),
            Err(VaultError::UserNotFound(_))
        ));
        assert!(matches!(
            m.remove_user_by_username("strangerX"),
            Err(VaultError::UserNotFound(_))
        ));
    }

    #[test]
    fn failed_remove_keeps_user_in_cache_and_storage() {
        let mut m = manager(vec![]);
        m.initialize().unwrap();
        let user = m.add_user("keepMe_01", &mut b"Str0ng!Pass".to_vec()).unwrap();

        m.repo.fail_writes = true;
        assert!(m.remove_user(&user).is_err());

        assert!(m.cached_users().unwrap().contains(&user));
        assert!(m.get_users().unwrap().contains(&user));
    }

    #[test]
    fn reset_to_default_leaves_only_a_fresh_default() {
        let mut m = manager(vec![]);
        m.initialize().unwrap();
        let old_default = defaults(&mut m).remove(0);
        m.add_user("someone_1", &mut b"Str0ng!Pass".to_vec()).unwrap();

        m.reset_to_default().unwrap();

        let users = m.get_users().unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_default());
        assert_ne!(users[0], old_default);
    }

    #[test]
    fn lookup_by_id() {
        let mut m = manager(vec![]);
        m.initialize().unwrap();
        let user = m.add_user("lookupById", &mut b"Str0ng!Pass".to_vec()).unwrap();
        assert_eq!(m.get_user_by_id(user.id()).unwrap(), Some(user));
        assert_eq!(m.get_user_by_id(Uuid::new_v4()).unwrap(), None);
    }
}
