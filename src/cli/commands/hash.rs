//! `credvault hash`: print a hash/salt pair for a password.
//!
//! Useful for provisioning records by hand. Uses the configured hash size
//! and iteration count.

use crate::cli::{load_settings, prompt_password, Cli};
use crate::errors::Result;

/// Execute the `hash` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (_, settings) = load_settings(cli)?;
    let hasher = settings.hasher()?;

    let mut password = prompt_password("Password to hash")?;
    let (hash, salt) = hasher.generate_hash(&mut password)?;

    println!("Hash: {hash}");
    println!("Salt: {salt}");
    Ok(())
}
