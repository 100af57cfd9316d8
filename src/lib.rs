pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod store;
pub mod users;

#[cfg(feature = "keyring-store")]
pub mod keyring;
