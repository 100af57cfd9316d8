//! Users module: accounts, roles, and sessions.
//!
//! This module provides:
//! - `Role` and `Permissions` (`role`)
//! - The immutable `User` entity and the default-user constants (`user`)
//! - The on-disk `UserDto` and its `UserMapper` (`dto`)
//! - Username and password rules (`policy`)
//! - Account lifecycle and the default-user invariant (`manager`)
//! - Sign-in, authorization, and profile changes (`auth`)

pub mod auth;
pub mod dto;
pub mod manager;
pub mod policy;
pub mod role;
pub mod user;

// Re-export the most commonly used items.
pub use auth::AuthenticationService;
pub use dto::{UserDto, UserMapper};
pub use manager::{UserManager, UserRepository};
pub use role::{Permissions, Role};
pub use user::{User, DEFAULT_PASSWORD, DEFAULT_USERNAME};
