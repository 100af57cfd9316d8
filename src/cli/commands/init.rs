//! `credvault init`: create the user store and its default administrator.

use crate::cli::output;
use crate::cli::{load_settings, user_manager, Cli};
use crate::errors::{Result, VaultError};
use crate::users::{DEFAULT_PASSWORD, DEFAULT_USERNAME};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (cwd, settings) = load_settings(cli)?;
    let store_path = settings.store_path(&cwd);

    if store_path.exists() {
        output::tip("Run `credvault users list` to see the existing accounts.");
        return Err(VaultError::InvalidOperation(format!(
            "a user store already exists at {}",
            store_path.display()
        )));
    }

    // Creates the encrypted file, fresh key material and the default user.
    let mut users = user_manager(&settings, &cwd)?;
    users.initialize()?;

    output::success(&format!("User store created at {}", store_path.display()));

    crate::cli::gitignore::ignore_store_dir(&cwd, &format!("{}/", settings.store_dir));

    if settings.supports_default_credentials()? {
        output::warning(&format!(
            "The '{DEFAULT_USERNAME}' administrator signs in with '{DEFAULT_PASSWORD}'."
        ));
        output::tip(&format!(
            "Run `credvault passwd {DEFAULT_USERNAME}` to change it now."
        ));
    } else {
        output::warning(&format!(
            "The '{DEFAULT_USERNAME}' administrator cannot sign in: its built-in password \
             only verifies with the default hash_size and hash_iterations."
        ));
        output::tip("Remove hash_size/hash_iterations from .credvault.toml to use `reset` and `destroy`.");
    }
    output::tip("Run `credvault register <username>` to add an account.");

    Ok(())
}
