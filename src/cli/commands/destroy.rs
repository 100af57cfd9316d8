//! `credvault destroy`: delete the user store and its key material.

use crate::cli::output;
use crate::cli::{confirm, open_session, Cli};
use crate::errors::{Result, VaultError};
use crate::users::DEFAULT_USERNAME;

/// Execute the `destroy` command.  Only the default user may run it.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let mut auth = open_session(cli, DEFAULT_USERNAME)?;
    auth.require_default_user()?;

    if !confirm(
        force,
        "Delete the user store and its encryption key? This cannot be undone",
    )? {
        return Err(VaultError::UserCancelled);
    }

    let store_path = auth.users().repository().path().to_path_buf();
    auth.delete_repository()?;

    output::success(&format!("Deleted {}", store_path.display()));
    output::tip("Run `credvault init` to start over.");
    Ok(())
}
