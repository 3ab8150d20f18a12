//! Database implementations

pub mod manager;
pub mod registration_repository;

pub use manager::*;
pub use registration_repository::*;
