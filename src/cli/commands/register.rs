//! `credvault register`: self-service account creation.

use crate::cli::output;
use crate::cli::{open_users, prompt_new_password, Cli};
use crate::errors::Result;
use crate::users::AuthenticationService;

/// Execute the `register` command.
pub fn execute(cli: &Cli, username: &str) -> Result<()> {
    let mut auth = AuthenticationService::new(open_users(cli)?);

    let mut password = prompt_new_password(&format!("Choose a password for '{username}'"))?;
    let user = auth.register(username, &mut password)?;

    output::success(&format!(
        "Registered '{}' with role {}",
        user.username(),
        user.role()
    ));
    output::tip(&format!("Run `credvault login {username}` to check the new credentials."));
    Ok(())
}
