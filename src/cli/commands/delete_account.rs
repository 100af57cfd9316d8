//! `credvault delete-account`: remove your own account.

use crate::cli::output;
use crate::cli::{confirm, open_session, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `delete-account` command.
pub fn execute(cli: &Cli, username: &str, force: bool) -> Result<()> {
    let mut auth = open_session(cli, username)?;

    if !confirm(force, &format!("Delete the account '{username}'? This cannot be undone"))? {
        return Err(VaultError::UserCancelled);
    }

    auth.delete_account()?;
    output::success(&format!("Deleted account '{username}'"));
    Ok(())
}
