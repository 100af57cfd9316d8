//! Sessions, credential checks, and profile changes.
//!
//! An `AuthenticationService` holds at most one signed-in user.  Wrong
//! usernames and wrong passwords look the same to the caller: both
//! return `Ok(false)` and leave the session alone.
//!
//! Every method that takes a password zeroes the buffer before it
//! returns, whatever the outcome.

use tracing::{debug, info};
use zeroize::Zeroize;

use super::manager::{UserManager, UserRepository};
use super::policy;
use super::role::{Permissions, Role};
use super::user::User;
use crate::errors::{Result, VaultError};
use crate::store::Repository;

pub struct AuthenticationService<R = UserRepository> {
    users: UserManager<R>,
    current: Option<User>,
}

/// Run `f`, then zero `password` no matter what `f` returned.
fn scrubbed<T>(password: &mut [u8], f: impl FnOnce(&mut [u8]) -> Result<T>) -> Result<T> {
    let result = f(password);
    password.zeroize();
    result
}

impl<R: Repository<User>> AuthenticationService<R> {
    pub fn new(users: UserManager<R>) -> Self {
        Self {
            users,
            current: None,
        }
    }

    pub fn users(&self) -> &UserManager<R> {
        &self.users
    }

    pub fn users_mut(&mut self) -> &mut UserManager<R> {
        &mut self.users
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    fn session(&self) -> Result<&User> {
        self.current.as_ref().ok_or(VaultError::NoAuthenticatedUser)
    }

    // ------------------------------------------------------------------
    // Sign-in
    // ------------------------------------------------------------------

    /// Check `username` and `password` against the stored accounts and
    /// start a session on success.
    ///
    /// Returns `Ok(false)` for an unknown user or a wrong password.
    pub fn authenticate(&mut self, username: &str, password: &mut [u8]) -> Result<bool> {
        scrubbed(password, |password| {
            if password.is_empty() {
                return Err(VaultError::InvalidArgument(
                    "password cannot be empty".into(),
                ));
            }

            let Some(user) = self.users.get_user_by_username(username)? else {
                debug!(username, "authentication failed");
                return Ok(false);
            };

            let valid = self
                .users
                .hasher()
                .validate(password, user.password_hash(), user.salt())?;

            if valid {
                info!(username, "authenticated");
                self.current = Some(user);
            } else {
                debug!(username, "authentication failed");
            }
            Ok(valid)
        })
    }

    /// Re-check the password of the signed-in user.
    pub fn authenticate_current_user(&mut self, password: &mut [u8]) -> Result<bool> {
        let username = match self.session() {
            Ok(user) => user.username().to_string(),
            Err(e) => {
                password.zeroize();
                return Err(e);
            }
        };
        self.authenticate(&username, password)
    }

    /// Create a new account after checking the username and password
    /// rules.  Does not sign the new user in.
    pub fn register(&mut self, username: &str, password: &mut [u8]) -> Result<User> {
        scrubbed(password, |password| {
            self.check_new_username(username)?;
            policy::check_password(password)?;
            self.users.add_user(username, password)
        })
    }

    /// End the session.  Safe to call without one.
    pub fn logout(&mut self) {
        if let Some(user) = self.current.take() {
            info!(username = user.username(), "logged out");
        }
    }

    /// Reload the signed-in user from storage.
    ///
    /// Fails with `NoAuthenticatedUser` if there is no session or the
    /// account no longer exists; in the latter case the session ends.
    pub fn refresh_current_user(&mut self) -> Result<&User> {
        let id = self.session()?.id();
        let fresh = self.users.get_users()?.into_iter().find(|u| u.id() == id);

        match fresh {
            Some(user) => {
                let user: &User = self.current.insert(user);
                Ok(user)
            }
            None => {
                self.current = None;
                Err(VaultError::NoAuthenticatedUser)
            }
        }
    }

    fn check_new_username(&mut self, username: &str) -> Result<()> {
        policy::check_username(username)?;
        if self.users.get_user_by_username(username)?.is_some() {
            return Err(VaultError::Username("Username already exists.".into()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------

    /// The signed-in user, if their role grants `permissions`.
    pub fn require_permission(&self, permissions: Permissions) -> Result<&User> {
        let user = self.session()?;
        if !user.has_permission(permissions) {
            return Err(VaultError::PermissionDenied(format!(
                "'{}' does not have the required permissions",
                user.username()
            )));
        }
        Ok(user)
    }

    /// The signed-in user, if it is the default administrator.
    pub fn require_default_user(&self) -> Result<&User> {
        let user = self.session()?;
        if !user.is_default() {
            return Err(VaultError::PermissionDenied(
                "only the default user can do this".into(),
            ));
        }
        Ok(user)
    }

    // ------------------------------------------------------------------
    // Own profile
    // ------------------------------------------------------------------

    /// Rename the signed-in user.
    pub fn change_username(&mut self, new_username: &str) -> Result<()> {
        let current = self.session()?.clone();
        if current.is_default() {
            return Err(VaultError::InvalidOperation(
                "the default user cannot be renamed".into(),
            ));
        }
        self.check_new_username(new_username)?;

        let renamed = current.with_username(new_username)?;
        self.users.update_user(renamed.clone())?;

        info!(from = current.username(), to = new_username, "renamed user");
        self.current = Some(renamed);
        Ok(())
    }

    /// Give the signed-in user a new password (and a new salt).
    pub fn change_password(&mut self, new_password: &mut [u8]) -> Result<()> {
        scrubbed(new_password, |new_password| {
            let current = self.session()?.clone();
            policy::check_password(new_password)?;

            let (hash, salt) = self.users.hasher().generate_hash(new_password)?;
            let updated = current.with_credentials(&hash, &salt)?;
            self.users.update_user(updated.clone())?;

            info!(username = updated.username(), "changed password");
            self.current = Some(updated);
            Ok(())
        })
    }

    /// Delete the signed-in user's own account and end the session.
    pub fn delete_account(&mut self) -> Result<()> {
        let current = self.session()?.clone();
        if current.is_default() {
            return Err(VaultError::InvalidOperation(
                "the default user cannot be deleted".into(),
            ));
        }

        self.users.remove_user(&current)?;
        self.logout();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// All accounts, for a signed-in user with read access.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.require_permission(Permissions::READ)?;
        self.users.get_users()
    }

    /// Give `username` the Admin role.  Requires delete permission.
    pub fn promote_user(&mut self, username: &str) -> Result<()> {
        self.require_permission(Permissions::DELETE)?;

        let target = self
            .users
            .get_user_by_username(username)?
            .ok_or_else(|| VaultError::UserNotFound(username.to_string()))?;
        if target.has_role(Role::Admin) {
            return Ok(());
        }

        self.users.update_user(target.with_role(Role::Admin))?;
        info!(username, "promoted user to Admin");
        Ok(())
    }

    /// Remove another account.  Requires delete permission; neither the
    /// default user nor the caller's own account can be removed this way.
    pub fn remove_user(&mut self, username: &str) -> Result<()> {
        let caller = self.require_permission(Permissions::DELETE)?.clone();

        let target = self
            .users
            .get_user_by_username(username)?
            .ok_or_else(|| VaultError::UserNotFound(username.to_string()))?;
        if target.is_default() {
            return Err(VaultError::InvalidOperation(
                "the default user cannot be deleted".into(),
            ));
        }
        if target == caller {
            return Err(VaultError::InvalidOperation(
                "use delete_account to remove your own account".into(),
            ));
        }

        self.users.remove_user(&target)
    }

    /// Drop every account and keep only a fresh default user.
    /// Default user only; ends the session.
    pub fn reset_to_default(&mut self) -> Result<()> {
        self.require_default_user()?;
        self.users.reset_to_default()?;
        self.logout();
        Ok(())
    }

    /// Delete the store and its key material.  Default user only; ends
    /// the session.
    pub fn delete_repository(&mut self) -> Result<()> {
        self.require_default_user()?;
        self.users.delete_repository()?;
        self.logout();
        Ok(())
    }
}
