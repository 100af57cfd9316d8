//! Store module: encrypted, cache-backed record persistence.
//!
//! This module provides:
//! - The `Entity` identity trait (`entity`)
//! - DTO validation and model/DTO mapping (`mapper`)
//! - The generic `Repository` contract (`repository`)
//! - `JsonRepository`, which keeps the whole collection as one
//!   encrypted JSON blob on disk (`json`)

pub mod entity;
pub mod json;
pub mod mapper;
pub mod repository;

// Re-export the most commonly used items.
pub use entity::Entity;
pub use json::JsonRepository;
pub use mapper::{DataTransferObject, Mapper};
pub use repository::Repository;
