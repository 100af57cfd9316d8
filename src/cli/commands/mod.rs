//! One module per `credvault` subcommand.

pub mod completions;
pub mod delete_account;
pub mod destroy;
pub mod hash;
pub mod init;
pub mod login;
pub mod passwd;
pub mod register;
pub mod rename;
pub mod reset;
pub mod users;
