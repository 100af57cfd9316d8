//! CLI module: Clap argument parser, output helpers, and command implementations.
//!
//! Commands only gather input and print results. Every rule about users,
//! passwords and permissions lives in the library.

pub mod commands;
pub mod gitignore;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::KeyManager;
use crate::errors::{Result, VaultError};
use crate::users::{AuthenticationService, UserManager, DEFAULT_USERNAME};

/// Environment variable consulted before prompting for a password.
pub const PASSWORD_ENV: &str = "CREDVAULT_PASSWORD";

/// Environment variable consulted before prompting for a new password.
pub const NEW_PASSWORD_ENV: &str = "CREDVAULT_NEW_PASSWORD";

/// CredVault CLI: local encrypted credential vault.
#[derive(Parser)]
#[command(
    name = "credvault",
    about = "Local encrypted credential vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store directory (overrides `store_dir` from .credvault.toml)
    #[arg(long, global = true)]
    pub dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create the user store with its default administrator
    Init,

    /// Create a new standard user account
    Register {
        /// Username for the new account
        username: String,
    },

    /// Check a user's credentials
    Login {
        /// Username to sign in as
        username: String,
    },

    /// Change a user's password
    Passwd {
        /// Username whose password changes
        username: String,
    },

    /// Rename a user account
    Rename {
        /// Current username
        username: String,
        /// New username
        new_username: String,
    },

    /// Delete your own account
    DeleteAccount {
        /// Username of the account to delete
        username: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Administer user accounts
    Users {
        /// Account used to authorize the action
        #[arg(long, default_value = DEFAULT_USERNAME)]
        admin: String,

        #[command(subcommand)]
        action: UsersAction,
    },

    /// Remove every account and keep only a fresh default user
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete the user store and its key material
    Destroy {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Print a PBKDF2 hash and salt for a password
    Hash,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Users subcommands, run on behalf of `--admin`.
#[derive(clap::Subcommand)]
pub enum UsersAction {
    /// List all accounts
    List,

    /// Create an account on someone else's behalf
    Add {
        /// Username for the new account
        username: String,
    },

    /// Remove another user's account
    Remove {
        /// Username to remove
        username: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Give a user the Admin role
    Promote {
        /// Username to promote
        username: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Read a password, trying `CREDVAULT_PASSWORD` before an interactive prompt.
///
/// The returned buffer is wiped on drop.
pub fn prompt_password(prompt: &str) -> Result<Zeroizing<Vec<u8>>> {
    if let Some(pw) = password_from_env(PASSWORD_ENV) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(into_bytes(Zeroizing::new(pw)))
}

/// Read a new password with confirmation, trying `CREDVAULT_NEW_PASSWORD`
/// first.  Strength rules are enforced by the library, not here.
pub fn prompt_new_password(prompt: &str) -> Result<Zeroizing<Vec<u8>>> {
    if let Some(pw) = password_from_env(NEW_PASSWORD_ENV) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm password", "Passwords do not match, try again")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(into_bytes(Zeroizing::new(pw)))
}

fn password_from_env(var: &str) -> Option<Zeroizing<Vec<u8>>> {
    match std::env::var(var) {
        Ok(pw) if !pw.is_empty() => Some(into_bytes(Zeroizing::new(pw))),
        _ => None,
    }
}

/// Move the string's buffer out without leaving a copy behind.
fn into_bytes(mut pw: Zeroizing<String>) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(std::mem::take(&mut *pw).into_bytes())
}

/// Load settings for the current directory, applying `--dir`.
pub fn load_settings(cli: &Cli) -> Result<(PathBuf, Settings)> {
    let cwd = std::env::current_dir()?;
    let mut settings = Settings::load(&cwd)?;
    if let Some(dir) = &cli.dir {
        settings.store_dir = dir.clone();
    }
    Ok((cwd, settings))
}

/// Build a `UserManager` for the configured store without touching disk.
pub fn user_manager(settings: &Settings, project_dir: &std::path::Path) -> Result<UserManager> {
    let key_manager = KeyManager::new(settings.key_manager_options()?)?;
    Ok(UserManager::open(
        settings.store_path(project_dir),
        key_manager,
        settings.hasher()?,
    ))
}

/// Open an existing store and enforce the default-user invariant.
pub fn open_users(cli: &Cli) -> Result<UserManager> {
    let (cwd, settings) = load_settings(cli)?;
    let store_path = settings.store_path(&cwd);
    if !store_path.exists() {
        return Err(VaultError::StoreNotFound(store_path));
    }

    let mut users = user_manager(&settings, &cwd)?;
    users.initialize()?;
    Ok(users)
}

/// Open the store and sign in as `username`, prompting for the password.
pub fn open_session(cli: &Cli, username: &str) -> Result<AuthenticationService> {
    let mut auth = AuthenticationService::new(open_users(cli)?);

    let mut password = prompt_password(&format!("Password for '{username}'"))?;
    if !auth.authenticate(username, &mut password)? {
        return Err(VaultError::CommandFailed(
            "invalid username or password".into(),
        ));
    }
    Ok(auth)
}

/// Ask for a yes/no confirmation unless `force` is set.
pub fn confirm(force: bool, prompt: &str) -> Result<bool> {
    if force {
        return Ok(true);
    }

    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))
}
