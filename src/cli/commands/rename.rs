//! `credvault rename`: give an account a new username.

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::Result;

/// Execute the `rename` command.
pub fn execute(cli: &Cli, username: &str, new_username: &str) -> Result<()> {
    let mut auth = open_session(cli, username)?;
    auth.change_username(new_username)?;

    output::success(&format!("Renamed '{username}' to '{new_username}'"));
    Ok(())
}
