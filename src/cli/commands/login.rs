//! `credvault login`: verify a user's credentials.

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `login` command.
pub fn execute(cli: &Cli, username: &str) -> Result<()> {
    let auth = open_session(cli, username)?;
    let user = auth.current_user().ok_or(VaultError::NoAuthenticatedUser)?;

    output::success(&format!(
        "Authenticated as '{}' ({})",
        user.username(),
        user.role()
    ));

    if user.has_initial_credentials() {
        output::warning("This account still uses the well-known default password.");
        output::tip(&format!("Run `credvault passwd {username}` to change it."));
    }
    Ok(())
}
