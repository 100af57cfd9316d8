//! User accounts.
//!
//! A `User` never changes after construction.  Edits produce a new
//! value with the same id, which then replaces the stored one.
//! Equality and hashing look at the id only.

use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

use super::role::{Permissions, Role};
use crate::errors::{Result, VaultError};
use crate::store::Entity;

/// Reserved username of the built-in administrator.
pub const DEFAULT_USERNAME: &str = "default";

/// Password of a freshly synthesized default user.
///
/// Anyone who can read this crate knows it; change it right after
/// `credvault init`.
pub const DEFAULT_PASSWORD: &str = "ChangeMe#1";

// PBKDF2-HMAC-SHA512 of DEFAULT_PASSWORD, 350,000 iterations, 64-byte salt.
const DEFAULT_PASSWORD_HASH: &str = "C1F14BB3B39DABB2F0880CA69EEE42B6A5AC5438036A1757BB5CD4AFAB57D7A4F6F500EFDA2D57342653DFF94C223FABB0FABEF06C115D946E2229AE4166AAA9";
const DEFAULT_SALT: &str = "63843A079CD7B78E443E565AFFCC7FE69B900A93757102483101FB55F06439AB9B3C60B4CD8F3B6F3C817256142782547CCBB549AC25F2B73EAC0772BA0DA5AD";

#[derive(Clone)]
pub struct User {
    id: Uuid,
    username: String,
    password_hash: String,
    salt: String,
    role: Role,
    is_default: bool,
}

impl User {
    fn build(
        id: Uuid,
        username: &str,
        password_hash: &str,
        salt: &str,
        role: Role,
        is_default: bool,
    ) -> Result<Self> {
        for (field, value) in [
            ("username", username),
            ("password hash", password_hash),
            ("salt", salt),
        ] {
            if value.trim().is_empty() {
                return Err(VaultError::InvalidArgument(format!(
                    "{field} cannot be empty"
                )));
            }
        }
        if !is_default && username == DEFAULT_USERNAME {
            return Err(VaultError::InvalidArgument(format!(
                "the username '{DEFAULT_USERNAME}' is reserved"
            )));
        }

        Ok(Self {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            salt: salt.to_string(),
            role,
            is_default,
        })
    }

    /// A brand-new, not yet persisted account with the `User` role.
    pub fn new(username: &str, password_hash: &str, salt: &str) -> Result<Self> {
        Self::build(Uuid::new_v4(), username, password_hash, salt, Role::User, false)
    }

    /// Rebuild a non-default account from stored fields.
    pub fn from_parts(
        id: Uuid,
        username: &str,
        password_hash: &str,
        salt: &str,
        role: Role,
    ) -> Result<Self> {
        Self::build(id, username, password_hash, salt, role, false)
    }

    /// A fresh default administrator with the well-known credentials.
    pub fn default_user() -> Self {
        Self {
            id: Uuid::new_v4(),
            username: DEFAULT_USERNAME.to_string(),
            password_hash: DEFAULT_PASSWORD_HASH.to_string(),
            salt: DEFAULT_SALT.to_string(),
            role: Role::Admin,
            is_default: true,
        }
    }

    /// Rebuild the default administrator from stored fields.
    pub fn restore_default(id: Uuid, password_hash: &str, salt: &str) -> Result<Self> {
        Self::build(id, DEFAULT_USERNAME, password_hash, salt, Role::Admin, true)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// True while the account still carries the well-known default
    /// hash and salt.
    pub fn has_initial_credentials(&self) -> bool {
        self.password_hash == DEFAULT_PASSWORD_HASH && self.salt == DEFAULT_SALT
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn has_permission(&self, permissions: Permissions) -> bool {
        self.role.permissions().contains(permissions)
    }

    /// Same account with a different role.
    pub fn with_role(&self, role: Role) -> Self {
        Self {
            role,
            ..self.clone()
        }
    }

    /// Same account under a new name.  The default user keeps its name.
    pub fn with_username(&self, username: &str) -> Result<Self> {
        if self.is_default {
            return Err(VaultError::InvalidOperation(
                "the default user cannot be renamed".into(),
            ));
        }
        Self::build(
            self.id,
            username,
            &self.password_hash,
            &self.salt,
            self.role,
            false,
        )
    }

    /// Same account with a new password hash and salt.
    pub fn with_credentials(&self, password_hash: &str, salt: &str) -> Result<Self> {
        Self::build(
            self.id,
            &self.username,
            password_hash,
            salt,
            self.role,
            self.is_default,
        )
    }
}

impl Entity for User {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("is_default", &self.is_default)
            .finish_non_exhaustive()
    }
}
