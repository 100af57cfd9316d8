//! On-disk shape of a user record.
//!
//! Field names are PascalCase in JSON:
//!
//! ```json
//! {"Id":"…","Username":"…","PasswordHash":"…","Salt":"…","IsDefault":false,"RoleName":"User"}
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;
use super::user::{User, DEFAULT_USERNAME};
use crate::errors::{Result, VaultError};
use crate::store::{DataTransferObject, Mapper};

/// Serialized user record.  Missing fields deserialize to empty values
/// and are caught by `validate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub salt: String,
    pub is_default: bool,
    pub role_name: String,
}

impl DataTransferObject for UserDto {
    fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.id.is_nil() {
            problems.push("Id is required.".to_string());
        }
        for (name, value) in [
            ("Username", &self.username),
            ("PasswordHash", &self.password_hash),
            ("Salt", &self.salt),
        ] {
            if value.trim().is_empty() {
                problems.push(format!("{name} is required."));
            }
        }

        let role = if self.role_name.trim().is_empty() {
            problems.push("RoleName is required.".to_string());
            None
        } else {
            let role = Role::from_name(&self.role_name).ok();
            if role.is_none() {
                problems.push("Invalid RoleName.".to_string());
            }
            role
        };

        if self.is_default && self.username != DEFAULT_USERNAME {
            problems.push(format!(
                "Default user must have username '{DEFAULT_USERNAME}'."
            ));
        }
        if !self.is_default && self.username == DEFAULT_USERNAME {
            problems.push(format!(
                "Non-default user cannot have username '{DEFAULT_USERNAME}'."
            ));
        }
        if self.is_default && role != Some(Role::Admin) {
            problems.push(format!("Default user must have role '{}'.", Role::Admin));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(VaultError::Validation(problems.join(" ")))
        }
    }
}

/// Maps `User` to and from `UserDto`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserMapper;

impl Mapper for UserMapper {
    type Model = User;
    type Dto = UserDto;

    fn to_dto(&self, user: &User) -> UserDto {
        UserDto {
            id: user.id(),
            username: user.username().to_string(),
            password_hash: user.password_hash().to_string(),
            salt: user.salt().to_string(),
            is_default: user.is_default(),
            role_name: user.role().name().to_string(),
        }
    }

    fn map_to_model(&self, dto: UserDto) -> Result<User> {
        if dto.is_default {
            return User::restore_default(dto.id, &dto.password_hash, &dto.salt);
        }
        User::from_parts(
            dto.id,
            &dto.username,
            &dto.password_hash,
            &dto.salt,
            Role::from_name(&dto.role_name)?,
        )
    }
}
