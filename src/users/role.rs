//! Roles and the permissions they grant.

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use crate::errors::{Result, VaultError};

/// A set of permission flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Permissions(u8);

impl Permissions {
    pub const NONE: Self = Self(0);
    pub const READ: Self = Self(1 << 0);
    pub const WRITE: Self = Self(1 << 1);
    pub const DELETE: Self = Self(1 << 2);

    /// True if every flag in `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One of the two fixed account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub const ADMIN_NAME: &'static str = "Admin";
    pub const USER_NAME: &'static str = "User";

    /// The name stored on disk.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Admin => Self::ADMIN_NAME,
            Self::User => Self::USER_NAME,
        }
    }

    pub const fn permissions(self) -> Permissions {
        match self {
            Self::Admin => Permissions(
                Permissions::READ.0 | Permissions::WRITE.0 | Permissions::DELETE.0,
            ),
            Self::User => Permissions(Permissions::READ.0 | Permissions::WRITE.0),
        }
    }

    /// Look a role up by its exact (case-sensitive) name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            Self::ADMIN_NAME => Ok(Self::Admin),
            Self::USER_NAME => Ok(Self::User),
            other => Err(VaultError::UnknownRole(other.to_string())),
        }
    }

    pub fn is_valid_name(name: &str) -> bool {
        Self::from_name(name).is_ok()
    }
}

impl FromStr for Role {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_everything_user_cannot_delete() {
        let admin = Role::Admin.permissions();
        assert!(admin.contains(Permissions::READ | Permissions::WRITE | Permissions::DELETE));

        let user = Role::User.permissions();
        assert!(user.contains(Permissions::READ | Permissions::WRITE));
        assert!(!user.contains(Permissions::DELETE));
    }

    #[test]
    fn lookup_by_name_is_exact() {
        assert_eq!(Role::from_name("Admin").unwrap(), Role::Admin);
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
        assert!(matches!(
            Role::from_name("admin"),
            Err(VaultError::UnknownRole(name)) if name == "admin"
        ));
        assert!(!Role::is_valid_name("Root"));
    }

    #[test]
    fn every_set_contains_none() {
        assert!(Permissions::NONE.contains(Permissions::NONE));
        assert!(Permissions::READ.contains(Permissions::NONE));
        assert!(!Permissions::NONE.contains(Permissions::READ));
    }
}
