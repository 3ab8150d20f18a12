//! # ERP Sync Domain
//!
//! Business domain types and models for the ERP customer synchronization core.
//!
//! This crate contains:
//! - Customer, entity, and registration data types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants and tax-id utilities
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::tax_id::{normalize_tax_id, TaxIdKind};
