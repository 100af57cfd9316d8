//! `credvault reset`: drop every account except a fresh default user.

use crate::cli::output;
use crate::cli::{confirm, open_session, Cli};
use crate::errors::{Result, VaultError};
use crate::users::{DEFAULT_PASSWORD, DEFAULT_USERNAME};

/// Execute the `reset` command.  Only the default user may run it.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let mut auth = open_session(cli, DEFAULT_USERNAME)?;
    auth.require_default_user()?;

    if !confirm(force, "Remove every account and restore the default user?")? {
        return Err(VaultError::UserCancelled);
    }

    auth.reset_to_default()?;

    output::success("All accounts removed; the default user was restored.");
    output::warning(&format!(
        "The '{DEFAULT_USERNAME}' administrator signs in with '{DEFAULT_PASSWORD}' again."
    ));
    Ok(())
}
