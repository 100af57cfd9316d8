//! `credvault passwd`: change a user's password.

use crate::cli::output;
use crate::cli::{open_session, prompt_new_password, Cli};
use crate::errors::Result;

/// Execute the `passwd` command.
///
/// The current password is read first (`CREDVAULT_PASSWORD`), then the new
/// one (`CREDVAULT_NEW_PASSWORD`).
pub fn execute(cli: &Cli, username: &str) -> Result<()> {
    let mut auth = open_session(cli, username)?;

    let mut new_password = prompt_new_password("New password")?;
    auth.change_password(&mut new_password)?;

    output::success(&format!("Password changed for '{username}'"));
    Ok(())
}
