//! `credvault users`: administer accounts on behalf of `--admin`.

use crate::cli::output;
use crate::cli::{confirm, open_session, prompt_new_password, Cli, UsersAction};
use crate::errors::{Result, VaultError};
use crate::users::Permissions;

/// Execute a `users` subcommand.
pub fn execute(cli: &Cli, admin: &str, action: &UsersAction) -> Result<()> {
    let mut auth = open_session(cli, admin)?;

    match action {
        UsersAction::List => {
            let users = auth.list_users()?;
            output::print_users_table(&users);
            output::info(&format!("{} account(s)", users.len()));
        }
        UsersAction::Add { username } => {
            // Creating accounts for others is an admin action.
            auth.require_permission(Permissions::DELETE)?;

            let mut password =
                prompt_new_password(&format!("Choose a password for '{username}'"))?;
            let user = auth.register(username, &mut password)?;
            output::success(&format!(
                "Added '{}' with role {}",
                user.username(),
                user.role()
            ));
        }
        UsersAction::Remove { username, force } => {
            if !confirm(*force, &format!("Remove the account '{username}'?"))? {
                return Err(VaultError::UserCancelled);
            }
            auth.remove_user(username)?;
            output::success(&format!("Removed '{username}'"));
        }
        UsersAction::Promote { username } => {
            auth.promote_user(username)?;
            output::success(&format!("'{username}' is now an Admin"));
        }
    }

    Ok(())
}
