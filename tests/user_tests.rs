//! End-to-end tests for accounts and sign-in over a real encrypted store.

use std::fs;
use std::path::PathBuf;

use credvault::crypto::{KeyIvEncryptor, KeyManager, KeyManagerOptions, PasswordHasher};
use credvault::errors::{RepositoryErrorKind, VaultError};
use credvault::store::{JsonRepository, Repository};
use credvault::users::{
    AuthenticationService, Role, User, UserManager, UserMapper, DEFAULT_PASSWORD,
    DEFAULT_USERNAME,
};
use tempfile::TempDir;

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn store_path(&self) -> PathBuf {
        self.dir.path().join(".credvault").join("users.vault")
    }

    fn key_manager(&self) -> KeyManager {
        let key = self.dir.path().join("keys/users.key");
        let iv = self.dir.path().join("keys/users.iv");
        KeyManager::new(KeyManagerOptions::file(
            key.to_str().unwrap(),
            iv.to_str().unwrap(),
        ))
        .unwrap()
    }

    /// Cheap hasher for accounts created by the tests.
    fn users(&self) -> UserManager {
        UserManager::open(
            self.store_path(),
            self.key_manager(),
            PasswordHasher::with_params(32, 1_000).unwrap(),
        )
    }

    /// Hasher matching the built-in default credentials.
    fn users_with_default_hasher(&self) -> UserManager {
        UserManager::open(
            self.store_path(),
            self.key_manager(),
            PasswordHasher::default(),
        )
    }

    fn service(&self) -> AuthenticationService {
        let mut users = self.users();
        users.initialize().unwrap();
        AuthenticationService::new(users)
    }
}

fn pw(s: &str) -> Vec<u8> {
    s.as_bytes().to_vec()
}

#[test]
fn register_then_authenticate_after_reopen() {
    let project = Project::new();

    let mut auth = project.service();
    let user = auth.register("validUser1", &mut pw("Str0ng!Pass")).unwrap();
    assert_eq!(user.role(), Role::User);
    assert!(!user.is_default());

    let mut reopened = project.service();
    assert!(reopened
        .authenticate("validUser1", &mut pw("Str0ng!Pass"))
        .unwrap());
    assert_eq!(reopened.current_user().unwrap().username(), "validUser1");

    assert!(!reopened
        .authenticate("validUser1", &mut pw("Wr0ng!Pass"))
        .unwrap());
    // A failed attempt leaves the existing session alone.
    assert_eq!(reopened.current_user().unwrap().username(), "validUser1");

    reopened.logout();
    assert!(matches!(
        reopened.authenticate_current_user(&mut pw("Str0ng!Pass")),
        Err(VaultError::NoAuthenticatedUser)
    ));
}

#[test]
fn initialize_creates_exactly_one_default_admin() {
    let project = Project::new();
    let mut users = project.users();
    users.initialize().unwrap();
    users.initialize().unwrap();

    let all = users.get_users().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].is_default());
    assert_eq!(all[0].username(), DEFAULT_USERNAME);
    assert_eq!(all[0].role(), Role::Admin);
}

#[test]
fn default_user_signs_in_with_default_password() {
    let project = Project::new();
    let mut users = project.users_with_default_hasher();
    users.initialize().unwrap();

    let mut auth = AuthenticationService::new(users);
    assert!(auth
        .authenticate(DEFAULT_USERNAME, &mut pw(DEFAULT_PASSWORD))
        .unwrap());
    assert!(auth.require_default_user().is_ok());
}

#[test]
fn two_default_users_make_the_store_unusable() {
    let project = Project::new();
    {
        let mut repo = JsonRepository::new(
            project.store_path(),
            UserMapper,
            KeyIvEncryptor::aes_gcm(project.key_manager()),
        );
        repo.initialize().unwrap();
        repo.add_record(User::default_user()).unwrap();
        repo.add_record(User::default_user()).unwrap();
    }

    let err = project.users().initialize().unwrap_err();
    assert!(matches!(err, VaultError::InvalidOperation(_)));
}

#[test]
fn usernames_are_unique() {
    let project = Project::new();
    let mut auth = project.service();
    auth.register("validUser1", &mut pw("Str0ng!Pass")).unwrap();

    let err = auth
        .register("validUser1", &mut pw("An0ther!Pass"))
        .unwrap_err();
    assert!(matches!(err, VaultError::Username(_)));

    // The manager enforces uniqueness on its own as well.
    let err = auth
        .users_mut()
        .add_user("validUser1", &mut pw("An0ther!Pass"))
        .unwrap_err();
    assert!(matches!(err, VaultError::UserAlreadyExists(_)));
    assert_eq!(auth.users().get_users().unwrap().len(), 2);
}

#[test]
fn weak_passwords_and_bad_names_are_rejected() {
    let project = Project::new();
    let mut auth = project.service();

    assert!(matches!(
        auth.register("validUser1", &mut pw("weakpass")),
        Err(VaultError::InvalidPassword(_))
    ));
    assert!(matches!(
        auth.register("1badname", &mut pw("Str0ng!Pass")),
        Err(VaultError::Username(_))
    ));
    assert_eq!(auth.users().get_users().unwrap().len(), 1);
}

#[test]
fn failed_write_leaves_store_and_cache_unchanged() {
    let project = Project::new();
    let mut auth = project.service();

    fs::create_dir(project.store_path().with_file_name(".users.vault.tmp")).unwrap();

    let err = auth
        .register("validUser1", &mut pw("Str0ng!Pass"))
        .unwrap_err();
    assert_eq!(err.repository_kind(), Some(RepositoryErrorKind::Io));

    assert!(auth
        .users_mut()
        .get_user_by_username("validUser1")
        .unwrap()
        .is_none());

    // The old file still decrypts with the restored key material.
    let mut reopened = project.users();
    reopened.initialize().unwrap();
    assert_eq!(reopened.get_users().unwrap().len(), 1);
}

#[test]
fn password_change_takes_effect_after_reopen() {
    let project = Project::new();
    let mut auth = project.service();
    auth.register("validUser1", &mut pw("Str0ng!Pass")).unwrap();
    assert!(auth.authenticate("validUser1", &mut pw("Str0ng!Pass")).unwrap());

    auth.change_password(&mut pw("N3w!Password")).unwrap();

    let mut reopened = project.service();
    assert!(!reopened
        .authenticate("validUser1", &mut pw("Str0ng!Pass"))
        .unwrap());
    assert!(reopened
        .authenticate("validUser1", &mut pw("N3w!Password"))
        .unwrap());
}

#[test]
fn admin_promotes_and_removes_users() {
    let project = Project::new();
    let mut auth = project.service();
    auth.register("validUser1", &mut pw("Str0ng!Pass")).unwrap();
    auth.register("validUser2", &mut pw("Str0ng!Pass")).unwrap();

    // A standard user cannot administer others.
    assert!(auth.authenticate("validUser1", &mut pw("Str0ng!Pass")).unwrap());
    assert!(matches!(
        auth.promote_user("validUser2"),
        Err(VaultError::PermissionDenied(_))
    ));

    // Promote validUser1 directly through the manager, then act as admin.
    let target = auth
        .users_mut()
        .get_user_by_username("validUser1")
        .unwrap()
        .unwrap();
    auth.users_mut()
        .update_user(target.with_role(Role::Admin))
        .unwrap();
    assert!(auth.authenticate("validUser1", &mut pw("Str0ng!Pass")).unwrap());

    auth.promote_user("validUser2").unwrap();
    auth.remove_user("validUser2").unwrap();

    let names: Vec<String> = auth
        .list_users()
        .unwrap()
        .iter()
        .map(|u| u.username().to_string())
        .collect();
    assert_eq!(names, vec![DEFAULT_USERNAME.to_string(), "validUser1".to_string()]);
}

#[test]
fn reset_keeps_only_a_fresh_default_user() {
    let project = Project::new();
    let mut users = project.users_with_default_hasher();
    users.initialize().unwrap();
    let mut auth = AuthenticationService::new(users);
    auth.register("validUser1", &mut pw("Str0ng!Pass")).unwrap();

    assert!(auth
        .authenticate(DEFAULT_USERNAME, &mut pw(DEFAULT_PASSWORD))
        .unwrap());
    auth.reset_to_default().unwrap();
    assert!(!auth.is_authenticated());

    let all = auth.users().get_users().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].is_default());
}

#[test]
fn delete_repository_removes_store_and_keys() {
    let project = Project::new();
    let mut users = project.users_with_default_hasher();
    users.initialize().unwrap();
    let mut auth = AuthenticationService::new(users);

    assert!(auth
        .authenticate(DEFAULT_USERNAME, &mut pw(DEFAULT_PASSWORD))
        .unwrap());
    auth.delete_repository().unwrap();

    assert!(!project.store_path().exists());
    assert!(!project.dir.path().join("keys/users.key").exists());
    assert!(!project.dir.path().join("keys/users.iv").exists());
}
